use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::warn;

use super::types::{CompressConfig, MosaicConfig};
use crate::atlas::PixelDepth;
use crate::cli::CompressionLevel;

/// Config file format version understood by this build
const CONFIG_VERSION: u32 = 1;

/// A validated configuration file with its associated directory.
///
/// Paths in the config are relative to the config file location,
/// so we track where the config was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MosaicConfig,
    /// The directory containing the config file
    pub config_dir: PathBuf,
}

impl LoadedConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_json(&content, config_dir)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Parse and validate config JSON whose relative paths start at `config_dir`.
    pub fn from_json(content: &str, config_dir: PathBuf) -> Result<Self> {
        let config: MosaicConfig = serde_json::from_str(content).context("malformed JSON")?;
        let loaded = Self { config, config_dir };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the atlas builder or PNG writer would refuse later.
    fn validate(&self) -> Result<()> {
        let config = &self.config;

        if config.version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} (expected {})",
                config.version,
                CONFIG_VERSION
            );
        }
        if config.initial_size == 0 {
            bail!("initial_size must be positive");
        }
        if config.max_size < config.initial_size {
            bail!(
                "max_size {} is smaller than initial_size {}",
                config.max_size,
                config.initial_size
            );
        }
        if config.pot && !config.initial_size.is_power_of_two() {
            bail!(
                "initial_size {} must be a power of two when pot is set",
                config.initial_size
            );
        }

        self.depth()?;
        self.compression()?;
        Ok(())
    }

    /// Resolve input patterns to actual file paths.
    ///
    /// Glob patterns are expanded, and all paths are resolved relative
    /// to the config file directory.
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut results = Vec::new();

        for pattern in &self.config.input {
            let full = self.config_dir.join(pattern);
            if !is_glob_pattern(pattern) {
                results.push(full);
                continue;
            }

            let matched_before = results.len();
            for entry in glob::glob(&full.to_string_lossy())
                .with_context(|| format!("invalid glob pattern: {}", pattern))?
            {
                results.push(
                    entry.with_context(|| format!("failed to read glob entry: {}", pattern))?,
                );
            }
            if results.len() == matched_before {
                warn!("Input pattern '{}' matched no files", pattern);
            }
        }

        Ok(results)
    }

    /// Resolve the output directory relative to the config file directory.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.config_dir.join(&self.config.output_dir)
    }

    /// Parse the configured pixel depth name.
    pub fn depth(&self) -> Result<PixelDepth> {
        parse_depth(&self.config.depth).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown depth '{}' in config file. Valid values: alpha, rgb, rgba",
                self.config.depth
            )
        })
    }

    /// PNG compression requested by the config, if any.
    pub fn compression(&self) -> Result<Option<CompressionLevel>> {
        let level = match &self.config.compress {
            None => return Ok(None),
            Some(CompressConfig::Level(n)) => n.to_string().parse::<CompressionLevel>(),
            Some(CompressConfig::Max(name)) => name.parse::<CompressionLevel>(),
        };
        level.map(Some).map_err(anyhow::Error::msg)
    }
}

fn parse_depth(s: &str) -> Option<PixelDepth> {
    match s {
        "alpha" => Some(PixelDepth::Alpha),
        "rgb" => Some(PixelDepth::Rgb),
        "rgba" => Some(PixelDepth::Rgba),
        _ => None,
    }
}

/// Check if a pattern contains glob characters.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}
