pub mod atlas;
pub mod cli;
pub mod config;
pub mod error;
pub mod glyph;
pub mod output;
pub mod packing;
pub mod sprite;

pub use atlas::{Atlas, AtlasBuilder, Capabilities, PixelDepth, PixelStore, Region, RegionId};
pub use cli::{CliArgs, Command, CommonArgs};
pub use error::MosaicError;
pub use glyph::{GlyphCache, GlyphRasterizer, TextLayout};
pub use packing::{MaxRectsPacker, PackingHeuristic, Rect};
pub use sprite::{PackedSprite, SourceSprite, SpriteSheet, TrimInfo};
