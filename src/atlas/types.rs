use std::fmt;

use serde::Serialize;

use crate::packing::Rect;

/// Stable handle to a region handed out by an [`Atlas`](super::Atlas).
///
/// Ids stay valid across grows; the rectangle behind an id does not, so
/// look it up again after any call that may have grown the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) usize);

impl RegionId {
    /// Allocation order of this region within its atlas
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Normalized texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

/// An allocated sub-rectangle of the atlas with its texture coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    rect: Rect,
    top_left: TexCoord,
    bottom_right: TexCoord,
}

impl Region {
    pub(crate) fn new(rect: Rect, atlas_width: u32, atlas_height: u32) -> Self {
        let mut region = Self {
            rect,
            top_left: TexCoord::default(),
            bottom_right: TexCoord::default(),
        };
        region.refresh(atlas_width, atlas_height);
        region
    }

    /// Recompute the normalized coordinates from the rectangle and the
    /// current atlas size
    pub(crate) fn refresh(&mut self, atlas_width: u32, atlas_height: u32) {
        self.top_left = normalize(self.rect.x, self.rect.y, atlas_width, atlas_height);
        self.bottom_right = normalize(self.rect.right(), self.rect.bottom(), atlas_width, atlas_height);
    }

    pub(crate) fn reassign(&mut self, rect: Rect, atlas_width: u32, atlas_height: u32) {
        self.rect = rect;
        self.refresh(atlas_width, atlas_height);
    }

    /// Pixel rectangle inside the atlas
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn width(&self) -> u32 {
        self.rect.width
    }

    pub fn height(&self) -> u32 {
        self.rect.height
    }

    pub fn top_left(&self) -> TexCoord {
        self.top_left
    }

    pub fn bottom_right(&self) -> TexCoord {
        self.bottom_right
    }

    /// `[u_min, v_min, u_max, v_max]`
    pub fn uv_bounds(&self) -> [f32; 4] {
        [
            self.top_left.u,
            self.top_left.v,
            self.bottom_right.u,
            self.bottom_right.v,
        ]
    }
}

pub(crate) fn normalize(x: u32, y: u32, width: u32, height: u32) -> TexCoord {
    TexCoord {
        u: x as f32 / width as f32,
        v: y as f32 / height as f32,
    }
}

/// Outcome of a single grow-and-migrate step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowResult {
    /// False when the ceiling was already reached and nothing moved
    pub changed: bool,
    pub width: u32,
    pub height: u32,
}

/// Texture limits of the graphics backend, determined once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Backend only accepts power-of-two texture dimensions
    pub power_of_two_textures: bool,
    /// Largest texture edge the backend can allocate
    pub max_texture_dimension: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            power_of_two_textures: false,
            max_texture_dimension: 16384,
        }
    }
}
