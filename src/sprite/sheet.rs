use image::{DynamicImage, RgbaImage};
use log::{debug, warn};

use super::{PackedSprite, SourceSprite, TrimInfo};
use crate::atlas::{Atlas, CpuPixelStore, PixelDepth, PixelStore, RegionId};

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    region: RegionId,
    trim_info: TrimInfo,
}

/// Sprites packed one by one into a growing atlas
#[derive(Debug)]
pub struct SpriteSheet<S: PixelStore = CpuPixelStore> {
    atlas: Atlas<S>,
    entries: Vec<SheetEntry>,
    skipped: Vec<String>,
}

impl<S: PixelStore> SpriteSheet<S> {
    pub fn new(atlas: Atlas<S>) -> Self {
        Self {
            atlas,
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn atlas(&self) -> &Atlas<S> {
        &self.atlas
    }

    pub fn into_atlas(self) -> Atlas<S> {
        self.atlas
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of sprites that could not be placed
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Allocate a region for `sprite` and upload its pixels, converted to
    /// the atlas depth. Returns `None` (and records the sprite as skipped)
    /// when the atlas cannot hold it even at its ceiling.
    pub fn add(&mut self, sprite: &SourceSprite) -> Option<RegionId> {
        let Some(region) = self.atlas.create_region(sprite.width(), sprite.height()) else {
            warn!(
                "Sprite '{}' ({}x{}) does not fit in the atlas (max {}px), skipping",
                sprite.name,
                sprite.width(),
                sprite.height(),
                self.atlas.max_dimension()
            );
            self.skipped.push(sprite.name.clone());
            return None;
        };

        let pixels = convert_pixels(&sprite.image, self.atlas.depth());
        if let Err(e) = self.atlas.set_region_pixels(region, &pixels, None) {
            warn!("Sprite '{}' upload failed: {}", sprite.name, e);
            self.skipped.push(sprite.name.clone());
            return None;
        }

        debug!("Added '{}' as region {}", sprite.name, region);
        self.entries.push(SheetEntry {
            name: sprite.name.clone(),
            region,
            trim_info: sprite.trim_info,
        });
        Some(region)
    }

    /// Add every sprite in order, returning how many were placed
    pub fn add_all(&mut self, sprites: &[SourceSprite]) -> usize {
        sprites
            .iter()
            .filter(|sprite| self.add(sprite).is_some())
            .count()
    }

    /// Current frames of every placed sprite.
    ///
    /// Frames are read from the atlas on each call, so they reflect any
    /// migration caused by later additions.
    pub fn packed(&self) -> Vec<PackedSprite> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let region = self.atlas.region(entry.region)?;
                let rect = region.rect();
                Some(PackedSprite {
                    name: entry.name.clone(),
                    region: entry.region,
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    uv: region.uv_bounds(),
                    trim_info: entry.trim_info,
                })
            })
            .collect()
    }
}

/// Tightly packed pixel rows of `image` at the given depth
fn convert_pixels(image: &RgbaImage, depth: PixelDepth) -> Vec<u8> {
    match depth {
        PixelDepth::Alpha => image.pixels().map(|p| p[3]).collect(),
        PixelDepth::Rgb => DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .into_raw(),
        PixelDepth::Rgba => image.as_raw().clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::Rgba;

    use super::*;
    use crate::atlas::AtlasBuilder;

    fn sprite(name: &str, width: u32, height: u32, color: [u8; 4]) -> SourceSprite {
        SourceSprite {
            path: PathBuf::from(name),
            name: name.to_string(),
            image: RgbaImage::from_pixel(width, height, Rgba(color)),
            trim_info: TrimInfo::untrimmed(width, height),
        }
    }

    #[test]
    fn test_convert_pixels() {
        let image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 40]));
        assert_eq!(convert_pixels(&image, PixelDepth::Alpha), vec![40, 40]);
        assert_eq!(
            convert_pixels(&image, PixelDepth::Rgb),
            vec![10, 20, 30, 10, 20, 30]
        );
        assert_eq!(convert_pixels(&image, PixelDepth::Rgba).len(), 8);
    }

    #[test]
    fn test_add_uploads_pixels() {
        let atlas = AtlasBuilder::new(32).build().unwrap();
        let mut sheet = SpriteSheet::new(atlas);

        let id = sheet.add(&sprite("red", 4, 2, [255, 0, 0, 255])).unwrap();
        let pixels = sheet.atlas().region_pixels(id).unwrap();
        assert_eq!(pixels.len(), 4 * 2 * 4);
        assert!(pixels.chunks(4).all(|p| p == [255, 0, 0, 255]));

        let packed = sheet.packed();
        assert_eq!(packed.len(), 1);
        assert_eq!((packed[0].x, packed[0].y), (0, 0));
        assert_eq!(packed[0].uv, [0.0, 0.0, 0.125, 0.0625]);
    }

    #[test]
    fn test_packed_frames_follow_grows() {
        let atlas = AtlasBuilder::new(16)
            .depth(PixelDepth::Alpha)
            .build()
            .unwrap();
        let mut sheet = SpriteSheet::new(atlas);

        let sprites: Vec<_> = (0..6u8)
            .map(|i| sprite(&format!("s{i}"), 10, 10, [0, 0, 0, 10 + i]))
            .collect();
        assert_eq!(sheet.add_all(&sprites), 6);
        assert!(sheet.atlas().generation() > 0);

        let packed = sheet.packed();
        for (i, frame) in packed.iter().enumerate() {
            let region = sheet.atlas().region(frame.region).unwrap();
            assert_eq!(region.rect().x, frame.x);
            assert_eq!(region.rect().y, frame.y);
            let pixels = sheet.atlas().region_pixels(frame.region).unwrap();
            assert!(pixels.iter().all(|&a| usize::from(a) == 10 + i));
        }
    }

    #[test]
    fn test_oversized_sprite_is_skipped() {
        let atlas = AtlasBuilder::new(16).max_dimension(32).build().unwrap();
        let mut sheet = SpriteSheet::new(atlas);

        assert!(sheet.add(&sprite("huge", 40, 8, [1, 1, 1, 1])).is_none());
        assert!(sheet.add(&sprite("ok", 8, 8, [1, 1, 1, 1])).is_some());
        assert_eq!(sheet.skipped(), ["huge".to_string()]);
        assert_eq!(sheet.len(), 1);
    }
}
