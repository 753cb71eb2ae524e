use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::atlas::PixelDepth;

#[derive(Parser, Debug)]
#[command(name = "mosaic")]
#[command(version, about = "Growing texture atlas packer", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Pack images into a growing atlas and write PNG + JSON metadata
    Pack(CommonArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Input image files or directories
    #[arg(required_unless_present = "config")]
    pub input: Vec<PathBuf>,

    /// Load settings from a JSON config file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for atlas files [default: .]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base name for output files (atlas.png, atlas.json) [default: atlas]
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Starting edge length of the square atlas [default: 256]
    #[arg(long, value_name = "PIXELS")]
    pub initial_size: Option<u32>,

    /// Largest edge the atlas may grow to [default: 1024]
    #[arg(long, value_name = "PIXELS")]
    pub max_size: Option<u32>,

    /// Pixel format of the atlas [default: rgba]
    #[arg(long, value_enum)]
    pub depth: Option<DepthArg>,

    /// Disable sprite trimming (remove transparent borders)
    #[arg(long)]
    pub no_trim: bool,

    /// Keep N pixels of transparent border after trimming [default: 0]
    #[arg(long)]
    pub trim_margin: Option<u32>,

    /// Only allow power-of-two atlas dimensions
    #[arg(long)]
    pub pot: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Compress PNG output (0-6 or 'max'). Default level is 2 if flag is present without value.
    #[arg(long, value_name = "LEVEL", default_missing_value = "2", num_args = 0..=1)]
    pub compress: Option<CompressionLevel>,
}

/// Atlas pixel format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum DepthArg {
    /// One byte per pixel, the source alpha channel
    Alpha,
    /// Three bytes per pixel, alpha dropped
    Rgb,
    #[default]
    Rgba,
}

impl From<DepthArg> for PixelDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Alpha => PixelDepth::Alpha,
            DepthArg::Rgb => PixelDepth::Rgb,
            DepthArg::Rgba => PixelDepth::Rgba,
        }
    }
}

/// PNG compression level (0-6 or max)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Optimization level 0-6
    Level(u8),
    /// Maximum compression
    Max,
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            return Ok(CompressionLevel::Max);
        }
        match s.parse::<u8>() {
            Ok(n) if n <= 6 => Ok(CompressionLevel::Level(n)),
            Ok(n) => Err(format!("compression level must be 0-6 or 'max', got {}", n)),
            Err(_e) => Err(format!("invalid compression level: {}", s)),
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel::Level(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level_parsing() {
        assert_eq!("max".parse::<CompressionLevel>(), Ok(CompressionLevel::Max));
        assert_eq!("MAX".parse::<CompressionLevel>(), Ok(CompressionLevel::Max));
        assert_eq!("4".parse::<CompressionLevel>(), Ok(CompressionLevel::Level(4)));
        assert!("7".parse::<CompressionLevel>().is_err());
        assert!("fast".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_pack_args() {
        let cli = CliArgs::try_parse_from([
            "mosaic",
            "pack",
            "sprites",
            "--depth",
            "alpha",
            "--max-size",
            "512",
            "--compress",
        ])
        .unwrap();

        let Command::Pack(args) = cli.command;
        assert_eq!(args.input, vec![PathBuf::from("sprites")]);
        assert_eq!(args.depth.map(PixelDepth::from), Some(PixelDepth::Alpha));
        assert_eq!(args.max_size, Some(512));
        assert_eq!(args.compress, Some(CompressionLevel::Level(2)));
        assert!(!args.no_trim);
    }

    #[test]
    fn test_input_required_without_config() {
        assert!(CliArgs::try_parse_from(["mosaic", "pack"]).is_err());
        assert!(CliArgs::try_parse_from(["mosaic", "pack", "-c", "mosaic.json"]).is_ok());
    }
}
