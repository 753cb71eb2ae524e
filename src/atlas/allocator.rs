use log::{debug, info, warn};

use super::types::{GrowResult, Region, RegionId};
use super::{CpuPixelStore, PixelDepth, PixelStore};
use super::store::check_source;
use crate::error::MosaicError;
use crate::packing::{MaxRectsPacker, PackingHeuristic, Rect};

/// Edge length of the region handed out for zero-sized requests
pub const PLACEHOLDER_SIZE: u32 = 4;

/// The atlas always packs Tetris-style so that re-packing in allocation
/// order after a grow reproduces a compact layout
const ATLAS_HEURISTIC: PackingHeuristic = PackingHeuristic::BottomLeft;

/// A texture atlas that grows on demand.
///
/// Regions are addressed by [`RegionId`]. When the packer cannot place a
/// request, the atlas doubles its smaller edge (up to the ceiling), re-packs
/// every region in allocation order, copies their pixels into the enlarged
/// store and retries. Any rectangle or texture coordinate read before such a
/// grow is stale afterwards; [`Atlas::generation`] and
/// [`Atlas::take_resized`] tell consumers when to rebuild derived geometry.
#[derive(Debug)]
pub struct Atlas<S: PixelStore = CpuPixelStore> {
    store: S,
    packer: MaxRectsPacker,
    regions: Vec<Region>,
    max_dimension: u32,
    generation: u64,
    resized: bool,
}

impl<S: PixelStore> Atlas<S> {
    pub(crate) fn from_parts(store: S, max_dimension: u32) -> Self {
        let packer = MaxRectsPacker::new(store.width(), store.height());
        Self {
            store,
            packer,
            regions: Vec::new(),
            max_dimension,
            generation: 0,
            resized: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.packer.bin_width()
    }

    pub fn height(&self) -> u32 {
        self.packer.bin_height()
    }

    pub fn depth(&self) -> PixelDepth {
        self.store.depth()
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Number of grows since construction
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once after each grow, then resets
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    pub fn occupancy(&self) -> f64 {
        self.packer.occupancy()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    /// All regions in allocation order
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, region)| (RegionId(i), region))
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Allocate a region, growing the atlas as often as needed.
    ///
    /// Zero-sized requests get a [`PLACEHOLDER_SIZE`] square so they still
    /// occupy paintable space. Returns `None` when the request cannot fit
    /// even at the ceiling.
    pub fn create_region(&mut self, width: u32, height: u32) -> Option<RegionId> {
        let (width, height) = if width == 0 || height == 0 {
            (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)
        } else {
            (width, height)
        };

        if width > self.max_dimension || height > self.max_dimension {
            warn!(
                "Region {}x{} exceeds the {} pixel atlas ceiling",
                width, height, self.max_dimension
            );
            return None;
        }

        loop {
            if let Some(rect) = self.packer.insert(width, height, ATLAS_HEURISTIC) {
                let id = RegionId(self.regions.len());
                self.regions
                    .push(Region::new(rect, self.width(), self.height()));
                debug!("Region {} placed at {:?}", id, rect);
                return Some(id);
            }

            if !self.grow().changed {
                warn!(
                    "Atlas full at {}x{}: cannot place {}x{}",
                    self.width(),
                    self.height(),
                    width,
                    height
                );
                return None;
            }
        }
    }

    /// Double the smaller edge (width on ties) and migrate every region.
    ///
    /// Regions are re-packed in allocation order and their pixels copied
    /// from the old store into the new one. Returns `changed: false` without
    /// touching anything when the doubled edge would pass the ceiling.
    pub fn grow(&mut self) -> GrowResult {
        let (old_width, old_height) = (self.width(), self.height());
        let Some((new_width, new_height)) =
            next_dimensions(old_width, old_height, self.max_dimension)
        else {
            return GrowResult {
                changed: false,
                width: old_width,
                height: old_height,
            };
        };

        // Re-pack before mutating anything
        let mut packer = MaxRectsPacker::new(new_width, new_height);
        let mut new_rects = Vec::with_capacity(self.regions.len());
        for (index, region) in self.regions.iter().enumerate() {
            #[expect(
                clippy::panic,
                reason = "a region that fit the smaller bin always fits the larger one"
            )]
            let Some(rect) = packer.insert(region.width(), region.height(), ATLAS_HEURISTIC) else {
                panic!(
                    "region #{} ({}x{}) failed to re-pack into {}x{}",
                    index,
                    region.width(),
                    region.height(),
                    new_width,
                    new_height
                );
            };
            new_rects.push(rect);
        }

        let old_stride = old_width as usize * self.depth().bytes();
        let snapshot = self.store.read_back();
        self.store.reallocate(new_width, new_height);

        for (region, new_rect) in self.regions.iter_mut().zip(new_rects) {
            let old_rect = region.rect();
            migrate_pixels(&mut self.store, &snapshot, old_stride, old_rect, new_rect);
            region.reassign(new_rect, new_width, new_height);
        }

        self.packer = packer;
        self.generation += 1;
        self.resized = true;

        info!(
            "Atlas grew from {}x{} to {}x{}, migrated {} regions",
            old_width,
            old_height,
            new_width,
            new_height,
            self.regions.len()
        );

        GrowResult {
            changed: true,
            width: new_width,
            height: new_height,
        }
    }

    /// Upload pixels into a region.
    ///
    /// Copies `height` rows of `width * depth` bytes, advancing through
    /// `data` by `stride` bytes per row (tightly packed when `None` or 0).
    pub fn set_region_pixels(
        &mut self,
        id: RegionId,
        data: &[u8],
        stride: Option<usize>,
    ) -> Result<(), MosaicError> {
        let rect = self
            .region(id)
            .ok_or(MosaicError::UnknownRegion(id.0))?
            .rect();
        let depth = self.depth();
        let stride = stride
            .filter(|&s| s > 0)
            .unwrap_or(rect.width as usize * depth.bytes());

        check_source(&rect, depth, data, stride)?;
        self.store.write_rect(rect, data, stride)
    }

    /// Fill every byte of a region with `value`
    pub fn fill_region(&mut self, id: RegionId, value: u8) -> Result<(), MosaicError> {
        let rect = self
            .region(id)
            .ok_or(MosaicError::UnknownRegion(id.0))?
            .rect();
        let data = vec![value; rect.width as usize * rect.height as usize * self.depth().bytes()];
        self.set_region_pixels(id, &data, None)
    }

    /// Read a region's pixels back as tightly packed rows
    pub fn region_pixels(&self, id: RegionId) -> Result<Vec<u8>, MosaicError> {
        let rect = self
            .region(id)
            .ok_or(MosaicError::UnknownRegion(id.0))?
            .rect();
        self.store.read_rect(rect)
    }
}

/// Size after one grow step, or `None` past the ceiling
fn next_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let (new_width, new_height) = if width <= height {
        (width.checked_mul(2)?, height)
    } else {
        (width, height.checked_mul(2)?)
    };

    if new_width > max_dimension || new_height > max_dimension {
        return None;
    }
    Some((new_width, new_height))
}

/// Copy one region out of the pre-grow snapshot into its new rectangle
#[expect(
    clippy::panic,
    reason = "source and destination are in bounds by construction"
)]
fn migrate_pixels<S: PixelStore>(
    store: &mut S,
    snapshot: &[u8],
    old_stride: usize,
    old_rect: Rect,
    new_rect: Rect,
) {
    let offset = old_rect.y as usize * old_stride + old_rect.x as usize * store.depth().bytes();
    if let Err(e) = store.write_rect(new_rect, &snapshot[offset..], old_stride) {
        panic!(
            "failed to migrate region {:?} to {:?}: {}",
            old_rect, new_rect, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasBuilder;
    use crate::atlas::types::normalize;

    /// Per-pixel pattern so stride mistakes show up as mismatches
    fn pattern(id: usize, len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 7 + id * 13 + 1) % 251) as u8).collect()
    }

    fn assert_coordinates_consistent<S: PixelStore>(atlas: &Atlas<S>) {
        for (id, region) in atlas.regions() {
            let rect = region.rect();
            assert_eq!(
                region.top_left(),
                normalize(rect.x, rect.y, atlas.width(), atlas.height()),
                "stale top-left on {}",
                id
            );
            assert_eq!(
                region.bottom_right(),
                normalize(rect.right(), rect.bottom(), atlas.width(), atlas.height()),
                "stale bottom-right on {}",
                id
            );
        }
    }

    #[test]
    fn test_first_region_at_origin() {
        let mut atlas = AtlasBuilder::new(128).build().unwrap();
        let id = atlas.create_region(10, 20).unwrap();
        let region = atlas.region(id).unwrap();

        assert_eq!(region.rect(), Rect::new(0, 0, 10, 20));
        assert_eq!(region.bottom_right().u, 10.0 / 128.0);
        assert_eq!(region.bottom_right().v, 20.0 / 128.0);
        assert_eq!(atlas.generation(), 0);
    }

    #[test]
    fn test_zero_size_gets_placeholder() {
        let mut atlas = AtlasBuilder::new(64).build().unwrap();
        let id = atlas.create_region(0, 12).unwrap();
        let region = atlas.region(id).unwrap();

        assert_eq!(region.width(), PLACEHOLDER_SIZE);
        assert_eq!(region.height(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn test_grow_preserves_content() {
        let mut atlas = AtlasBuilder::new(64)
            .depth(PixelDepth::Alpha)
            .build()
            .unwrap();

        let mut written = Vec::new();
        for i in 0..16 {
            let id = atlas.create_region(16, 16).unwrap();
            let data = pattern(i, 16 * 16);
            atlas.set_region_pixels(id, &data, None).unwrap();
            written.push((id, atlas.region(id).unwrap().rect(), data));
        }
        assert_eq!(atlas.generation(), 0);
        assert!(!atlas.take_resized());

        // The 64x64 bin is exactly full, so this forces a grow
        let extra = atlas.create_region(16, 16).unwrap();
        assert_eq!((atlas.width(), atlas.height()), (128, 64));
        assert_eq!(atlas.generation(), 1);
        assert!(atlas.take_resized());
        assert!(!atlas.take_resized());
        assert_eq!(atlas.region(extra).unwrap().rect(), Rect::new(0, 32, 16, 16));

        for (id, old_rect, data) in &written {
            assert_eq!(&atlas.region_pixels(*id).unwrap(), data, "content of {}", id);
            assert_eq!(atlas.region(*id).unwrap().width(), old_rect.width);
        }

        // Re-packing in allocation order moves the second row up beside the first
        assert_eq!(written[4].1, Rect::new(0, 16, 16, 16));
        assert_eq!(atlas.region(written[4].0).unwrap().rect(), Rect::new(64, 0, 16, 16));

        assert_coordinates_consistent(&atlas);
    }

    #[test]
    fn test_grow_preserves_rgba_content_with_padded_uploads() {
        let mut atlas = AtlasBuilder::new(32).build().unwrap();
        let mut written = Vec::new();

        for (i, (w, h)) in [(20, 10), (12, 30), (9, 9), (25, 7), (30, 30)].iter().enumerate() {
            let id = atlas.create_region(*w, *h).unwrap();
            let stride = *w as usize * 4 + 5;
            let mut padded = vec![0xAB; stride * *h as usize];
            let tight = pattern(i, *w as usize * *h as usize * 4);
            for row in 0..*h as usize {
                let src = &tight[row * *w as usize * 4..(row + 1) * *w as usize * 4];
                padded[row * stride..row * stride + src.len()].copy_from_slice(src);
            }
            atlas.set_region_pixels(id, &padded, Some(stride)).unwrap();
            written.push((id, tight));
        }

        assert!(atlas.generation() > 0);
        for (id, tight) in &written {
            assert_eq!(&atlas.region_pixels(*id).unwrap(), tight);
        }
        assert_coordinates_consistent(&atlas);
    }

    #[test]
    fn test_grow_preserves_rgb_content() {
        let mut atlas = AtlasBuilder::new(16)
            .depth(PixelDepth::Rgb)
            .build()
            .unwrap();
        let mut written = Vec::new();

        // Odd widths make the 3-byte row length differ from any power of two
        for (i, (w, h)) in [(7, 5), (9, 11), (5, 3), (13, 7), (11, 9)].iter().enumerate() {
            let id = atlas.create_region(*w, *h).unwrap();
            let row_bytes = *w as usize * 3;
            let stride = row_bytes + 2;
            let tight = pattern(i, row_bytes * *h as usize);
            let mut padded = vec![0xEE; stride * *h as usize];
            for row in 0..*h as usize {
                padded[row * stride..row * stride + row_bytes]
                    .copy_from_slice(&tight[row * row_bytes..(row + 1) * row_bytes]);
            }
            atlas.set_region_pixels(id, &padded, Some(stride)).unwrap();
            written.push((id, tight));
        }

        assert!(atlas.generation() > 0);
        assert_eq!(atlas.store().pixels().len(), atlas.width() as usize * atlas.height() as usize * 3);
        for (id, tight) in &written {
            assert_eq!(&atlas.region_pixels(*id).unwrap(), tight, "content of {}", id);
        }
        assert_coordinates_consistent(&atlas);
    }

    #[test]
    fn test_grows_several_times_in_one_request() {
        let mut atlas = AtlasBuilder::new(16).max_dimension(256).build().unwrap();
        let id = atlas.create_region(100, 20).unwrap();

        // 32x16, 32x32, 64x32, 64x64, 128x64
        assert_eq!((atlas.width(), atlas.height()), (128, 64));
        assert_eq!(atlas.generation(), 5);
        assert_eq!(atlas.region(id).unwrap().rect(), Rect::new(0, 0, 100, 20));
    }

    #[test]
    fn test_oversized_request_fails_without_growing() {
        let mut atlas = AtlasBuilder::new(64).max_dimension(1024).build().unwrap();
        assert!(atlas.create_region(2048, 2048).is_none());
        assert_eq!((atlas.width(), atlas.height()), (64, 64));
        assert_eq!(atlas.generation(), 0);
    }

    #[test]
    fn test_exhaustion_at_ceiling() {
        let mut atlas = AtlasBuilder::new(16).max_dimension(32).build().unwrap();
        let ids: Vec<_> = (0..4).map(|_| atlas.create_region(16, 16)).collect();
        assert!(ids.iter().all(Option::is_some));
        assert_eq!((atlas.width(), atlas.height()), (32, 32));

        assert!(atlas.create_region(16, 16).is_none());
        assert_eq!(atlas.region_count(), 4);

        let result = atlas.grow();
        assert!(!result.changed);
        assert_eq!((result.width, result.height), (32, 32));
        assert!((atlas.occupancy() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_explicit_grow_doubles_width_on_ties() {
        let mut atlas = AtlasBuilder::new(64).build().unwrap();
        let first = atlas.grow();
        assert!(first.changed);
        assert_eq!((first.width, first.height), (128, 64));

        let second = atlas.grow();
        assert_eq!((second.width, second.height), (128, 128));
        assert_eq!(atlas.store().pixels().len(), 128 * 128 * 4);
    }

    #[test]
    fn test_set_region_pixels_stays_inside_region() {
        let mut atlas = AtlasBuilder::new(8)
            .depth(PixelDepth::Alpha)
            .build()
            .unwrap();
        let a = atlas.create_region(2, 2).unwrap();
        let b = atlas.create_region(2, 2).unwrap();

        atlas.set_region_pixels(b, &[1, 2, 3, 4], None).unwrap();
        atlas.fill_region(a, 9).unwrap();

        assert_eq!(atlas.region_pixels(a).unwrap(), vec![9; 4]);
        assert_eq!(atlas.region_pixels(b).unwrap(), vec![1, 2, 3, 4]);
        let touched: usize = atlas.store().pixels().iter().filter(|&&p| p != 0).count();
        assert_eq!(touched, 8);
    }

    #[test]
    fn test_set_region_pixels_errors() {
        let mut atlas = AtlasBuilder::new(8)
            .depth(PixelDepth::Rgb)
            .build()
            .unwrap();
        let id = atlas.create_region(2, 2).unwrap();

        assert!(matches!(
            atlas.set_region_pixels(RegionId(5), &[0; 12], None),
            Err(MosaicError::UnknownRegion(5))
        ));
        assert!(matches!(
            atlas.set_region_pixels(id, &[0; 11], None),
            Err(MosaicError::PixelDataTooShort {
                expected: 12,
                actual: 11
            })
        ));
        assert!(matches!(
            atlas.set_region_pixels(id, &[0; 12], Some(4)),
            Err(MosaicError::StrideTooSmall { .. })
        ));
    }

    #[test]
    fn test_next_dimensions() {
        assert_eq!(next_dimensions(64, 64, 1024), Some((128, 64)));
        assert_eq!(next_dimensions(128, 64, 1024), Some((128, 128)));
        assert_eq!(next_dimensions(64, 128, 1024), Some((128, 128)));
        assert_eq!(next_dimensions(1024, 1024, 1024), None);
        assert_eq!(next_dimensions(1024, 512, 1024), Some((1024, 1024)));
    }

    /// Store wrapper that counts full read-backs
    #[derive(Debug)]
    struct CountingStore {
        inner: CpuPixelStore,
        read_backs: std::cell::Cell<usize>,
    }

    impl PixelStore for CountingStore {
        fn width(&self) -> u32 {
            self.inner.width()
        }

        fn height(&self) -> u32 {
            self.inner.height()
        }

        fn depth(&self) -> PixelDepth {
            self.inner.depth()
        }

        fn reallocate(&mut self, width: u32, height: u32) {
            self.inner.reallocate(width, height);
        }

        fn write_rect(&mut self, rect: Rect, data: &[u8], stride: usize) -> Result<(), MosaicError> {
            self.inner.write_rect(rect, data, stride)
        }

        fn read_back(&self) -> Vec<u8> {
            self.read_backs.set(self.read_backs.get() + 1);
            self.inner.read_back()
        }
    }

    #[test]
    fn test_custom_store_snapshots_once_per_grow() {
        let store = CountingStore {
            inner: CpuPixelStore::new(1, 1, PixelDepth::Alpha),
            read_backs: std::cell::Cell::new(0),
        };
        let mut atlas = AtlasBuilder::new(16)
            .depth(PixelDepth::Alpha)
            .build_with_store(store)
            .unwrap();

        atlas.create_region(16, 16).unwrap();
        atlas.create_region(16, 16).unwrap();
        atlas.create_region(16, 16).unwrap();

        assert_eq!(atlas.generation(), 2);
        assert_eq!(atlas.store().read_backs.get(), 2);

        // Stores without their own read_rect fall back to a full read-back
        let id = atlas.create_region(8, 8).unwrap();
        atlas.fill_region(id, 3).unwrap();
        assert_eq!(atlas.region_pixels(id).unwrap(), vec![3; 64]);
        assert_eq!(atlas.store().read_backs.get(), 3);
    }
}
