use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use mosaic::atlas::{AtlasBuilder, Capabilities, PixelDepth};
use mosaic::cli::{CliArgs, Command, CommonArgs, CompressionLevel};
use mosaic::config::LoadedConfig;
use mosaic::output::{atlas_png_filename, save_atlas_image, write_json};
use mosaic::sprite::{SpriteSheet, load_sprites};

#[allow(clippy::print_stderr)]
fn main() {
    if let Err(e) = run() {
        // The logger may not be initialized yet (e.g. config loading failed)
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliArgs::parse();
    let Command::Pack(args) = &cli.command;

    let merged = merge_config_with_args(args)?;

    env_logger::Builder::new()
        .filter_level(if merged.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    info!("Mosaic atlas packer v{}", env!("CARGO_PKG_VERSION"));

    if !merged.output.exists() {
        fs::create_dir_all(&merged.output)?;
    }

    let sprites = load_sprites(
        &merged.input,
        merged.trim,
        merged.trim_margin,
        merged.base_dir.as_deref(),
    )?;
    info!("Loaded {} sprites", sprites.len());

    let atlas = AtlasBuilder::new(merged.initial_size)
        .depth(merged.depth)
        .max_dimension(merged.max_size)
        .capabilities(Capabilities {
            power_of_two_textures: merged.pot,
            ..Capabilities::default()
        })
        .build()
        .context("invalid atlas settings")?;

    let mut sheet = SpriteSheet::new(atlas);
    let placed = sheet.add_all(&sprites);
    if !sheet.skipped().is_empty() {
        warn!(
            "{} sprites did not fit: {}",
            sheet.skipped().len(),
            sheet.skipped().join(", ")
        );
    }
    info!(
        "Packed {} sprites into {}x{} ({:.1}% used, {} grows)",
        placed,
        sheet.atlas().width(),
        sheet.atlas().height(),
        sheet.atlas().occupancy() * 100.0,
        sheet.atlas().generation()
    );

    let image_path = merged.output.join(atlas_png_filename(&merged.name));
    save_atlas_image(sheet.atlas(), &image_path, merged.compress)?;
    info!("Saved {}", image_path.display());

    write_json(&sheet, &merged.output, &merged.name)?;
    info!("Generated {}.json", merged.name);

    info!("Done!");

    Ok(())
}

/// Merged configuration from CLI args and optional config file.
struct MergedConfig {
    input: Vec<PathBuf>,
    /// Directory sprite names are made relative to, when inputs come from a config
    base_dir: Option<PathBuf>,
    output: PathBuf,
    name: String,
    initial_size: u32,
    max_size: u32,
    depth: PixelDepth,
    trim: bool,
    trim_margin: u32,
    pot: bool,
    verbose: bool,
    compress: Option<CompressionLevel>,
}

/// Merge config file values with CLI arguments.
/// CLI arguments always take precedence over config values.
fn merge_config_with_args(args: &CommonArgs) -> Result<MergedConfig> {
    let loaded_config = if let Some(config_path) = &args.config {
        Some(
            LoadedConfig::load(config_path)
                .with_context(|| format!("failed to load config: {}", config_path.display()))?,
        )
    } else {
        None
    };

    // Input files: CLI args override config
    let (input, base_dir) = if !args.input.is_empty() {
        (args.input.clone(), None)
    } else if let Some(ref lc) = loaded_config {
        let inputs = lc
            .resolve_inputs()
            .context("failed to resolve input files from config")?;
        (inputs, Some(lc.config_dir.clone()))
    } else {
        // clap's required_unless_present rules this out
        (Vec::new(), None)
    };

    let output = args.output.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.resolve_output_dir())
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let name = args.name.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.name.clone())
            .unwrap_or_else(|| "atlas".to_string())
    });

    // Numeric fields: CLI > config > default
    let initial_size = args.initial_size.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.initial_size)
            .unwrap_or(256)
    });

    let max_size = args.max_size.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.max_size)
            .unwrap_or(1024)
    });

    let trim_margin = args.trim_margin.unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.trim_margin)
            .unwrap_or(0)
    });

    let depth = if let Some(d) = args.depth {
        d.into()
    } else if let Some(ref lc) = loaded_config {
        lc.depth()?
    } else {
        PixelDepth::Rgba
    };

    // Boolean flags: CLI presence sets them, otherwise use config
    let trim = if args.no_trim {
        false
    } else if let Some(ref lc) = loaded_config {
        lc.config.trim
    } else {
        true
    };

    let pot = if args.pot {
        true
    } else if let Some(ref lc) = loaded_config {
        lc.config.pot
    } else {
        false
    };

    let compress = if args.compress.is_some() {
        args.compress
    } else if let Some(ref lc) = loaded_config {
        lc.compression()?
    } else {
        None
    };

    Ok(MergedConfig {
        input,
        base_dir,
        output,
        name,
        initial_size,
        max_size,
        depth,
        trim,
        trim_margin,
        pot,
        verbose: args.verbose,
        compress,
    })
}
