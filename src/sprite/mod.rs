mod loader;
mod sheet;
mod sprite;
mod trimmer;

pub use loader::load_sprites;
pub use sheet::SpriteSheet;
pub use sprite::{PackedSprite, SourceSprite, TrimInfo};
pub use trimmer::trim_sprite;
