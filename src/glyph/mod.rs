//! Font glyph caching on top of the growing atlas.

mod cache;
mod layout;

pub use cache::{Glyph, GlyphBitmap, GlyphCache, GlyphRasterizer, SOLID_GLYPH};
pub use layout::{GlyphQuad, TextLayout};
