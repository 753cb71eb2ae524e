use std::collections::HashMap;

use log::{debug, warn};

use crate::atlas::{
    Atlas, AtlasBuilder, CpuPixelStore, PLACEHOLDER_SIZE, PixelDepth, PixelStore, RegionId,
    check_source,
};
use crate::error::MosaicError;
use crate::packing::Rect;

/// Character key of the solid white glyph used for lines and backgrounds
pub const SOLID_GLYPH: char = '\u{0}';

/// Font sizes below this start with a 128 pixel atlas, larger ones with 256
const SMALL_FONT_SIZE: f32 = 20.0;

/// A rendered glyph bitmap as produced by the font library
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub rows: u32,
    /// Bytes between the starts of consecutive rows; 0 means tightly packed
    pub pitch: usize,
    /// Horizontal offset from the pen position to the left edge
    pub left: i32,
    /// Vertical offset from the baseline to the top edge
    pub top: i32,
    /// Horizontal pen advance
    pub advance: f32,
    pub buffer: Vec<u8>,
}

impl GlyphBitmap {
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.rows == 0 || self.buffer.is_empty()
    }

    /// Row pitch with 0 resolved to tightly packed rows
    fn stride(&self, depth: PixelDepth) -> usize {
        if self.pitch == 0 {
            self.width as usize * depth.bytes()
        } else {
            self.pitch
        }
    }

    /// Check that the buffer holds `rows` rows of `width` pixels at this pitch
    fn validate(&self, depth: PixelDepth) -> Result<(), MosaicError> {
        let bounds = Rect::new(0, 0, self.width, self.rows);
        check_source(&bounds, depth, &self.buffer, self.stride(depth))
    }
}

/// Boundary to the font rasterization library
pub trait GlyphRasterizer {
    /// Bytes per pixel of the bitmaps this rasterizer produces
    fn depth(&self) -> PixelDepth;

    /// Render a character, or `None` if the face has no glyph for it
    fn rasterize(&mut self, ch: char) -> Option<GlyphBitmap>;

    /// Horizontal adjustment between two consecutive characters
    fn kerning(&self, _previous: char, _current: char) -> f32 {
        0.0
    }
}

/// A glyph cached in the atlas
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub region: RegionId,
    /// Bitmap size in pixels, zero for blank glyphs such as spaces
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub advance: f32,
    /// Blank glyphs hold a transparent placeholder region and are never drawn
    pub blank: bool,
}

/// Glyph bitmaps of one font face packed into a growing atlas
pub struct GlyphCache<R: GlyphRasterizer, S: PixelStore = CpuPixelStore> {
    pub(super) rasterizer: R,
    pub(super) atlas: Atlas<S>,
    pub(super) glyphs: HashMap<char, Glyph>,
    solid_region: RegionId,
}

impl<R: GlyphRasterizer> GlyphCache<R, CpuPixelStore> {
    /// Create a cache with an in-memory atlas sized for `font_size`
    pub fn new(rasterizer: R, font_size: f32) -> Result<Self, MosaicError> {
        let initial = if font_size < SMALL_FONT_SIZE { 128 } else { 256 };
        let atlas = AtlasBuilder::new(initial)
            .depth(rasterizer.depth())
            .build()?;
        Self::with_atlas(rasterizer, atlas)
    }
}

impl<R: GlyphRasterizer, S: PixelStore> GlyphCache<R, S> {
    /// Create a cache on an existing, empty atlas
    pub fn with_atlas(rasterizer: R, mut atlas: Atlas<S>) -> Result<Self, MosaicError> {
        if atlas.depth() != rasterizer.depth() {
            return Err(MosaicError::InvalidAtlasConfig(format!(
                "atlas depth {:?} does not match rasterizer depth {:?}",
                atlas.depth(),
                rasterizer.depth()
            )));
        }

        let solid_region = atlas
            .create_region(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)
            .ok_or_else(|| {
                MosaicError::InvalidAtlasConfig("no room for the solid glyph".to_string())
            })?;
        atlas.fill_region(solid_region, 0xFF)?;

        let mut glyphs = HashMap::new();
        glyphs.insert(
            SOLID_GLYPH,
            Glyph {
                ch: SOLID_GLYPH,
                region: solid_region,
                width: PLACEHOLDER_SIZE,
                height: PLACEHOLDER_SIZE,
                left: 0,
                top: 0,
                advance: 0.0,
                blank: false,
            },
        );

        Ok(Self {
            rasterizer,
            atlas,
            glyphs,
            solid_region,
        })
    }

    pub fn atlas(&self) -> &Atlas<S> {
        &self.atlas
    }

    /// Region of the solid white glyph
    pub fn solid_region(&self) -> RegionId {
        self.solid_region
    }

    /// Number of cached glyphs, including the solid glyph
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Look up a glyph, rasterizing and caching it on first use.
    ///
    /// Returns `None` when the font has no such glyph or the atlas is full;
    /// the caller should simply skip drawing it.
    pub fn glyph(&mut self, ch: char) -> Option<&Glyph> {
        if !self.glyphs.contains_key(&ch) && !self.load_glyph(ch) {
            return None;
        }
        self.glyphs.get(&ch)
    }

    /// Load every glyph of `text`, returning how many could not be cached
    pub fn load_glyphs(&mut self, text: &str) -> usize {
        let mut missed = 0;
        for ch in text.chars() {
            if !self.glyphs.contains_key(&ch) && !self.load_glyph(ch) {
                missed += 1;
            }
        }
        missed
    }

    fn load_glyph(&mut self, ch: char) -> bool {
        let Some(bitmap) = self.rasterizer.rasterize(ch) else {
            debug!("No glyph for {:?}", ch);
            return false;
        };

        let blank = bitmap.is_blank();
        // Reject malformed bitmaps before they take up atlas space
        if !blank {
            if let Err(e) = bitmap.validate(self.atlas.depth()) {
                warn!("Glyph {:?} has an unusable bitmap: {}", ch, e);
                return false;
            }
        }

        // Blank glyphs still get a (transparent) placeholder region
        let region = if blank {
            self.atlas.create_region(0, 0)
        } else {
            self.atlas.create_region(bitmap.width, bitmap.rows)
        };
        let Some(region) = region else {
            warn!(
                "Glyph {:?} ({}x{}) could not be cached",
                ch, bitmap.width, bitmap.rows
            );
            return false;
        };

        if !blank {
            let stride = bitmap.stride(self.atlas.depth());
            if let Err(e) = self
                .atlas
                .set_region_pixels(region, &bitmap.buffer, Some(stride))
            {
                warn!("Glyph {:?} upload failed: {}", ch, e);
                return false;
            }
        }

        self.glyphs.insert(
            ch,
            Glyph {
                ch,
                region,
                width: if blank { 0 } else { bitmap.width },
                height: if blank { 0 } else { bitmap.rows },
                left: bitmap.left,
                top: bitmap.top,
                advance: bitmap.advance,
                blank,
            },
        );
        true
    }
}
