use std::path::PathBuf;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::atlas::RegionId;

/// Trimming information to reconstruct original sprite positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrimInfo {
    /// Pixels trimmed from left edge
    pub offset_x: u32,
    /// Pixels trimmed from top edge
    pub offset_y: u32,
    /// Original width before trimming
    pub source_width: u32,
    /// Original height before trimming
    pub source_height: u32,
    pub trimmed_width: u32,
    pub trimmed_height: u32,
}

impl TrimInfo {
    /// Create TrimInfo for an untrimmed sprite
    pub fn untrimmed(width: u32, height: u32) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            source_width: width,
            source_height: height,
            trimmed_width: width,
            trimmed_height: height,
        }
    }

    /// Returns true if the sprite was actually trimmed
    pub fn was_trimmed(&self) -> bool {
        self.trimmed_width != self.source_width || self.trimmed_height != self.source_height
    }
}

/// A decoded sprite waiting to be placed in an atlas
#[derive(Debug, Clone)]
pub struct SourceSprite {
    pub path: PathBuf,
    /// Unique identifier (relative path or filename)
    pub name: String,
    /// Image data, with transparent borders removed if trimming was enabled
    pub image: RgbaImage,
    pub trim_info: TrimInfo,
}

impl SourceSprite {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A sprite's final location in the atlas, resolved after all grows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedSprite {
    pub name: String,
    #[serde(skip)]
    pub region: RegionId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// `[u_min, v_min, u_max, v_max]`
    pub uv: [f32; 4],
    pub trim_info: TrimInfo,
}
