use super::{Atlas, Capabilities, CpuPixelStore, PixelDepth, PixelStore};
use crate::error::MosaicError;

/// Default ceiling on either atlas edge
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Configuration for atlas construction
#[derive(Debug, Clone)]
pub struct AtlasBuilder {
    pub initial_dimension: u32,
    pub depth: PixelDepth,
    pub max_dimension: u32,
    pub capabilities: Capabilities,
}

impl AtlasBuilder {
    /// Start a square atlas of `initial_dimension` pixels per edge
    pub fn new(initial_dimension: u32) -> Self {
        Self {
            initial_dimension,
            depth: PixelDepth::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            capabilities: Capabilities::default(),
        }
    }

    pub fn depth(mut self, depth: PixelDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Largest edge the atlas may grow to
    pub fn ceiling(&self) -> u32 {
        self.max_dimension
            .min(self.capabilities.max_texture_dimension)
    }

    /// Build an atlas backed by an in-memory pixel store
    pub fn build(&self) -> Result<Atlas<CpuPixelStore>, MosaicError> {
        self.validate()?;
        let store = CpuPixelStore::new(self.initial_dimension, self.initial_dimension, self.depth);
        Ok(Atlas::from_parts(store, self.ceiling()))
    }

    /// Build an atlas on top of a caller-provided store, which is
    /// reallocated to the initial dimension
    pub fn build_with_store<S: PixelStore>(&self, mut store: S) -> Result<Atlas<S>, MosaicError> {
        self.validate()?;
        if store.depth() != self.depth {
            return Err(MosaicError::InvalidAtlasConfig(format!(
                "store depth {:?} does not match requested depth {:?}",
                store.depth(),
                self.depth
            )));
        }
        store.reallocate(self.initial_dimension, self.initial_dimension);
        Ok(Atlas::from_parts(store, self.ceiling()))
    }

    fn validate(&self) -> Result<(), MosaicError> {
        if self.initial_dimension == 0 {
            return Err(MosaicError::InvalidAtlasConfig(
                "initial dimension must be positive".to_string(),
            ));
        }

        if self.initial_dimension > self.ceiling() {
            return Err(MosaicError::InvalidAtlasConfig(format!(
                "initial dimension {} exceeds the {} pixel ceiling",
                self.initial_dimension,
                self.ceiling()
            )));
        }

        if self.capabilities.power_of_two_textures && !self.initial_dimension.is_power_of_two() {
            return Err(MosaicError::InvalidAtlasConfig(format!(
                "initial dimension {} is not a power of two",
                self.initial_dimension
            )));
        }

        Ok(())
    }
}
