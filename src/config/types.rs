use serde::{Deserialize, Serialize};

/// PNG compression level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressConfig {
    /// Optimization level 0-6
    Level(u8),
    /// Maximum compression ("max")
    Max(String),
}

/// Mosaic configuration file structure.
///
/// All paths in the config are relative to the config file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Config file version (currently 1)
    pub version: u32,
    /// Input file paths or glob patterns
    pub input: Vec<String>,
    pub output_dir: String,
    /// Base name for output files (atlas.png, atlas.json)
    pub name: String,
    /// Starting edge length of the square atlas
    pub initial_size: u32,
    /// Ceiling on either atlas edge
    pub max_size: u32,
    /// Pixel format: "alpha", "rgb" or "rgba"
    pub depth: String,
    /// Only allow power-of-two atlas dimensions
    pub pot: bool,
    /// Enable sprite trimming (remove transparent borders)
    pub trim: bool,
    /// Keep N pixels of transparent border after trimming
    pub trim_margin: u32,
    pub compress: Option<CompressConfig>,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            version: 1,
            input: Vec::new(),
            output_dir: ".".to_string(),
            name: "atlas".to_string(),
            initial_size: 256,
            max_size: 1024,
            depth: "rgba".to_string(),
            pot: false,
            trim: true,
            trim_margin: 0,
            compress: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MosaicConfig =
            serde_json::from_str(r#"{ "input": ["sprites/*.png"], "depth": "alpha" }"#).unwrap();

        assert_eq!(config.input, vec!["sprites/*.png".to_string()]);
        assert_eq!(config.depth, "alpha");
        assert_eq!(config.initial_size, 256);
        assert_eq!(config.max_size, 1024);
        assert!(config.trim);
        assert!(config.compress.is_none());
    }

    #[test]
    fn test_compress_variants() {
        let level: MosaicConfig = serde_json::from_str(r#"{ "compress": 4 }"#).unwrap();
        assert_eq!(level.compress, Some(CompressConfig::Level(4)));

        let max: MosaicConfig = serde_json::from_str(r#"{ "compress": "max" }"#).unwrap();
        assert_eq!(max.compress, Some(CompressConfig::Max("max".to_string())));
    }
}
