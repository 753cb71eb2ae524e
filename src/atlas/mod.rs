mod allocator;
mod builder;
mod store;
mod types;

pub use allocator::{Atlas, PLACEHOLDER_SIZE};
pub use builder::{AtlasBuilder, DEFAULT_MAX_DIMENSION};
pub(crate) use store::check_source;
pub use store::{CpuPixelStore, PixelDepth, PixelStore};
pub use types::{Capabilities, GrowResult, Region, RegionId, TexCoord};
