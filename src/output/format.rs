use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::Result;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use crate::atlas::{Atlas, CpuPixelStore, PixelDepth, PixelStore};
use crate::cli::CompressionLevel;
use crate::error::MosaicError;

/// Encode the atlas store as an image matching its depth
pub fn atlas_image(atlas: &Atlas<CpuPixelStore>) -> Result<DynamicImage> {
    let (width, height) = (atlas.width(), atlas.height());
    let pixels = atlas.store().pixels().to_vec();

    let image = match atlas.store().depth() {
        PixelDepth::Alpha => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        PixelDepth::Rgb => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        PixelDepth::Rgba => RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8),
    };

    image.ok_or_else(|| {
        MosaicError::PixelDataTooShort {
            expected: width as usize * height as usize * atlas.depth().bytes(),
            actual: atlas.store().pixels().len(),
        }
        .into()
    })
}

/// Save atlas image as PNG, optionally with compression
pub fn save_atlas_image(
    atlas: &Atlas<CpuPixelStore>,
    path: &Path,
    compress: Option<CompressionLevel>,
) -> Result<()> {
    let image = atlas_image(atlas)?;

    let mut png_data = Cursor::new(Vec::new());
    image
        .write_to(&mut png_data, ImageFormat::Png)
        .map_err(|e| MosaicError::ImageSave {
            path: path.to_path_buf(),
            source: e,
        })?;

    let output_data = if let Some(level) = compress {
        let opts = match level {
            CompressionLevel::Level(n) => oxipng::Options::from_preset(n),
            CompressionLevel::Max => oxipng::Options::max_compression(),
        };
        oxipng::optimize_from_memory(&png_data.into_inner(), &opts).map_err(|e| {
            MosaicError::PngCompress {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?
    } else {
        png_data.into_inner()
    };

    fs::write(path, output_data).map_err(|e| MosaicError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasBuilder;

    #[test]
    fn test_atlas_image_matches_depth() {
        let mut atlas = AtlasBuilder::new(8)
            .depth(PixelDepth::Alpha)
            .build()
            .unwrap();
        let id = atlas.create_region(2, 2).unwrap();
        atlas.fill_region(id, 200).unwrap();

        let image = atlas_image(&atlas).unwrap();
        let gray = image.as_luma8().unwrap();
        assert_eq!(gray.dimensions(), (8, 8));
        assert_eq!(gray.get_pixel(1, 1)[0], 200);
        assert_eq!(gray.get_pixel(2, 2)[0], 0);

        let rgb = AtlasBuilder::new(4)
            .depth(PixelDepth::Rgb)
            .build()
            .unwrap();
        assert!(atlas_image(&rgb).unwrap().as_rgb8().is_some());
    }

    #[test]
    fn test_save_and_reload() {
        let mut atlas = AtlasBuilder::new(16).build().unwrap();
        let id = atlas.create_region(3, 3).unwrap();
        atlas.fill_region(id, 9).unwrap();

        let path = std::env::temp_dir().join(format!("mosaic-format-{}.png", std::process::id()));
        save_atlas_image(&atlas, &path, None).unwrap();
        let reloaded = image::open(&path).unwrap().into_rgba8();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(reloaded.dimensions(), (16, 16));
        assert_eq!(reloaded.get_pixel(2, 2).0, [9, 9, 9, 9]);
    }
}
