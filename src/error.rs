use std::path::PathBuf;
use thiserror::Error;

use crate::packing::Rect;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No valid images found in input")]
    NoImages,

    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to compress PNG '{path}': {message}")]
    PngCompress { path: PathBuf, message: String },

    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid atlas configuration: {0}")]
    InvalidAtlasConfig(String),

    #[error("Unsupported pixel depth {0} (expected 1, 3 or 4 bytes per pixel)")]
    UnsupportedDepth(u8),

    #[error("Unknown atlas region {0}")]
    UnknownRegion(usize),

    #[error("Region {rect:?} lies outside the {width}x{height} pixel store")]
    RegionOutOfBounds { rect: Rect, width: u32, height: u32 },

    #[error("Pixel data too short: need {expected} bytes, got {actual}")]
    PixelDataTooShort { expected: usize, actual: usize },

    #[error("Stride of {stride} bytes is smaller than a {row_bytes}-byte row")]
    StrideTooSmall { stride: usize, row_bytes: usize },
}
