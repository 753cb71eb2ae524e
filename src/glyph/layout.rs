use super::cache::{Glyph, GlyphCache, GlyphRasterizer};
use crate::atlas::{Atlas, PixelStore, RegionId, TexCoord};

/// One textured quad of laid out text, in pixels relative to the text origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub top_left: TexCoord,
    pub bottom_right: TexCoord,
    pub color: [u8; 4],
}

/// Laid out text, tied to the atlas generation its coordinates came from
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub quads: Vec<GlyphQuad>,
    pub width: f32,
    pub height: f32,
    generation: u64,
}

impl TextLayout {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the cache's atlas has grown since this layout was built.
    /// Stale layouts carry outdated texture coordinates and must be rebuilt.
    pub fn is_stale<R: GlyphRasterizer, S: PixelStore>(&self, cache: &GlyphCache<R, S>) -> bool {
        self.generation != cache.atlas.generation()
    }
}

/// Vertical metrics of a run of glyphs
#[derive(Debug, Default)]
struct Extent {
    width: f32,
    /// Tallest distance above the baseline
    ascent: f32,
    /// Deepest distance below the baseline
    underhang: f32,
}

impl<R: GlyphRasterizer, S: PixelStore> GlyphCache<R, S> {
    /// Pixel size of `text`, loading any glyphs not yet cached
    pub fn string_size(&mut self, text: &str) -> (f32, f32) {
        let (_, extent) = self.collect(text);
        (extent.width.ceil(), extent.ascent + extent.underhang)
    }

    /// Lay out `text` on a single line.
    ///
    /// All glyphs are loaded before any texture coordinate is read, so a grow
    /// triggered by a late glyph cannot leave earlier quads pointing at old
    /// locations.
    pub fn layout(&mut self, text: &str, color: [u8; 4]) -> TextLayout {
        let (glyphs, extent) = self.collect(text);

        let mut quads = Vec::with_capacity(glyphs.len());
        let mut pen = 0.0;
        let mut previous = None;
        for glyph in &glyphs {
            if let Some(prev) = previous {
                pen += self.rasterizer.kerning(prev, glyph.ch);
            }
            previous = Some(glyph.ch);

            if !glyph.blank {
                let height = glyph.height as f32;
                let below = height - glyph.top as f32;
                let x0 = (pen + glyph.left as f32).round();
                let y1 = (extent.ascent + below).trunc();
                quads.push(self.quad(
                    glyph.region,
                    [x0, y1 - height, x0 + glyph.width as f32, y1],
                    color,
                ));
            }
            pen += glyph.advance;
        }

        TextLayout {
            quads,
            width: extent.width.ceil(),
            height: extent.ascent + extent.underhang,
            generation: self.atlas.generation(),
        }
    }

    /// A quad filled with the solid glyph, for underlines and backgrounds
    pub fn solid_quad(&self, bounds: [f32; 4], color: [u8; 4]) -> GlyphQuad {
        self.quad(self.solid_region(), bounds, color)
    }

    fn quad(&self, region: RegionId, [x0, y0, x1, y1]: [f32; 4], color: [u8; 4]) -> GlyphQuad {
        let (top_left, bottom_right) = tex_coords(&self.atlas, region);
        GlyphQuad {
            x0,
            y0,
            x1,
            y1,
            top_left,
            bottom_right,
            color,
        }
    }

    fn collect(&mut self, text: &str) -> (Vec<Glyph>, Extent) {
        let mut glyphs: Vec<Glyph> = Vec::with_capacity(text.len());
        let mut extent = Extent::default();

        for ch in text.chars() {
            let Some(glyph) = self.glyph(ch).cloned() else {
                continue;
            };
            if let Some(prev) = glyphs.last() {
                extent.width += self.rasterizer.kerning(prev.ch, ch);
            }
            extent.width += glyph.advance;
            if !glyph.blank {
                let below = glyph.height as f32 - glyph.top as f32;
                extent.underhang = extent.underhang.max(below);
                extent.ascent = extent.ascent.max(glyph.top as f32);
            }
            glyphs.push(glyph);
        }

        (glyphs, extent)
    }
}

fn tex_coords<S: PixelStore>(atlas: &Atlas<S>, region: RegionId) -> (TexCoord, TexCoord) {
    atlas
        .region(region)
        .map(|r| (r.top_left(), r.bottom_right()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::super::cache::tests::FakeRasterizer;
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_layout_positions() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        let layout = cache.layout("ab", WHITE);

        // 6x6 glyphs, left 1, top 5, advance 7
        assert_eq!(layout.quads.len(), 2);
        assert_eq!(layout.width, 14.0);
        assert_eq!(layout.height, 6.0);

        let a = layout.quads[0];
        assert_eq!((a.x0, a.y0, a.x1, a.y1), (1.0, 0.0, 7.0, 6.0));
        let b = layout.quads[1];
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (8.0, 0.0, 14.0, 6.0));
        assert_eq!(b.color, WHITE);
    }

    #[test]
    fn test_quads_match_atlas_regions() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        let layout = cache.layout("xy", WHITE);

        for (quad, ch) in layout.quads.iter().zip(['x', 'y']) {
            let id = cache.glyph(ch).unwrap().region;
            let region = cache.atlas().region(id).unwrap();
            assert_eq!(quad.top_left, region.top_left());
            assert_eq!(quad.bottom_right, region.bottom_right());
        }
    }

    #[test]
    fn test_blank_and_missing_glyphs() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        let layout = cache.layout("a ?b", WHITE);

        // The space advances the pen without a quad, '?' is skipped entirely
        assert_eq!(layout.quads.len(), 2);
        assert_eq!(layout.quads[1].x0, 12.0);
        assert_eq!(layout.width, 18.0);
    }

    #[test]
    fn test_kerning() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        assert_eq!(cache.string_size("AV"), (13.0, 6.0));

        let layout = cache.layout("AV", WHITE);
        assert_eq!(layout.quads[1].x0, (7.0_f32 - 1.5 + 1.0).round());
    }

    #[test]
    fn test_string_size_of_empty_text() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        assert_eq!(cache.string_size(""), (0.0, 0.0));
    }

    #[test]
    fn test_layout_goes_stale_after_grow() {
        // 40 pixel glyphs: only a handful fit before the 128 atlas grows
        let mut cache = GlyphCache::new(FakeRasterizer::new(40), 12.0).unwrap();
        let layout = cache.layout("ab", WHITE);
        assert!(!layout.is_stale(&cache));

        assert_eq!(cache.load_glyphs("cdefghijkl"), 0);
        assert!(cache.atlas().width() > 128 || cache.atlas().height() > 128);
        assert!(layout.is_stale(&cache));

        let rebuilt = cache.layout("ab", WHITE);
        assert!(!rebuilt.is_stale(&cache));
        let id = cache.glyph('b').unwrap().region;
        let region = cache.atlas().region(id).unwrap();
        assert_eq!(rebuilt.quads[1].top_left, region.top_left());
    }

    #[test]
    fn test_grow_during_layout_keeps_quads_consistent() {
        let mut cache = GlyphCache::new(FakeRasterizer::new(40), 12.0).unwrap();
        let generation = cache.atlas().generation();
        let layout = cache.layout("abcdefghij", WHITE);

        assert!(cache.atlas().generation() > generation);
        assert!(!layout.is_stale(&cache));
        for (quad, ch) in layout.quads.iter().zip("abcdefghij".chars()) {
            let id = cache.glyph(ch).unwrap().region;
            assert_eq!(quad.top_left, cache.atlas().region(id).unwrap().top_left());
        }
    }

    #[test]
    fn test_solid_quad() {
        let cache = GlyphCache::new(FakeRasterizer::new(6), 12.0).unwrap();
        let quad = cache.solid_quad([0.0, 10.0, 20.0, 11.0], WHITE);
        let solid = cache.atlas().region(cache.solid_region()).unwrap();

        assert_eq!(quad.top_left, solid.top_left());
        assert_eq!(quad.bottom_right, solid.bottom_right());
        assert_eq!((quad.x1, quad.y1), (20.0, 11.0));
    }
}
