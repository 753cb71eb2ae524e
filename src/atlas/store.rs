use crate::error::MosaicError;
use crate::packing::Rect;

/// Bytes per pixel of a backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelDepth {
    /// Single alpha channel (glyph coverage)
    Alpha,
    /// 8-bit RGB (LCD subpixel glyphs, opaque sprites)
    Rgb,
    /// 8-bit RGBA
    #[default]
    Rgba,
}

impl PixelDepth {
    pub fn bytes(self) -> usize {
        match self {
            PixelDepth::Alpha => 1,
            PixelDepth::Rgb => 3,
            PixelDepth::Rgba => 4,
        }
    }
}

impl TryFrom<u8> for PixelDepth {
    type Error = MosaicError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PixelDepth::Alpha),
            3 => Ok(PixelDepth::Rgb),
            4 => Ok(PixelDepth::Rgba),
            other => Err(MosaicError::UnsupportedDepth(other)),
        }
    }
}

/// Storage behind an atlas, usually a GPU texture.
///
/// The atlas only ever needs three things from it: reallocating at a new
/// size, writing a sub-rectangle from a strided buffer, and reading the
/// whole image back while it migrates content into a larger store.
pub trait PixelStore: std::fmt::Debug {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn depth(&self) -> PixelDepth;

    /// Discard the current contents and allocate a zeroed store of the given size
    fn reallocate(&mut self, width: u32, height: u32);

    /// Copy `rect.height` rows of `rect.width * depth` bytes from `data`
    /// into `rect`, advancing the source by `stride` bytes per row
    fn write_rect(&mut self, rect: Rect, data: &[u8], stride: usize) -> Result<(), MosaicError>;

    /// Read the entire store back as tightly packed rows
    fn read_back(&self) -> Vec<u8>;

    /// Read one rectangle back as tightly packed rows.
    ///
    /// The default goes through [`PixelStore::read_back`]; stores with
    /// cheaper partial reads should override it.
    fn read_rect(&self, rect: Rect) -> Result<Vec<u8>, MosaicError> {
        check_bounds(rect, self.width(), self.height())?;
        Ok(copy_rect(&self.read_back(), self.width(), self.depth(), rect))
    }
}

fn check_bounds(rect: Rect, width: u32, height: u32) -> Result<(), MosaicError> {
    if rect.right() > width || rect.bottom() > height {
        return Err(MosaicError::RegionOutOfBounds {
            rect,
            width,
            height,
        });
    }
    Ok(())
}

/// Copy `rect` out of a tightly packed image `store_width` pixels wide
fn copy_rect(pixels: &[u8], store_width: u32, depth: PixelDepth, rect: Rect) -> Vec<u8> {
    let bpp = depth.bytes();
    let stride = store_width as usize * bpp;
    let row_bytes = rect.width as usize * bpp;
    let mut out = Vec::with_capacity(row_bytes * rect.height as usize);

    for row in rect.y as usize..rect.bottom() as usize {
        let start = row * stride + rect.x as usize * bpp;
        out.extend_from_slice(&pixels[start..start + row_bytes]);
    }

    out
}

/// Number of source bytes a strided copy of `rect` touches
pub(crate) fn strided_len(rect: &Rect, depth: PixelDepth, stride: usize) -> usize {
    if rect.is_empty() {
        return 0;
    }
    (rect.height as usize - 1) * stride + rect.width as usize * depth.bytes()
}

/// Validate a strided source buffer against the rectangle it will fill
pub(crate) fn check_source(
    rect: &Rect,
    depth: PixelDepth,
    data: &[u8],
    stride: usize,
) -> Result<(), MosaicError> {
    let row_bytes = rect.width as usize * depth.bytes();
    if stride < row_bytes {
        return Err(MosaicError::StrideTooSmall { stride, row_bytes });
    }
    let expected = strided_len(rect, depth, stride);
    if data.len() < expected {
        return Err(MosaicError::PixelDataTooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// In-memory pixel store, row-major and tightly packed
#[derive(Debug, Clone)]
pub struct CpuPixelStore {
    width: u32,
    height: u32,
    depth: PixelDepth,
    pixels: Vec<u8>,
}

impl CpuPixelStore {
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Self {
        Self {
            width,
            height,
            depth,
            pixels: vec![0; width as usize * height as usize * depth.bytes()],
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the store, returning its raw bytes
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn row_stride(&self) -> usize {
        self.width as usize * self.depth.bytes()
    }
}

impl PixelStore for CpuPixelStore {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn depth(&self) -> PixelDepth {
        self.depth
    }

    fn reallocate(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * self.depth.bytes()];
    }

    fn write_rect(&mut self, rect: Rect, data: &[u8], stride: usize) -> Result<(), MosaicError> {
        check_bounds(rect, self.width, self.height)?;
        check_source(&rect, self.depth, data, stride)?;

        let bpp = self.depth.bytes();
        let row_bytes = rect.width as usize * bpp;
        let dst_stride = self.row_stride();

        for row in 0..rect.height as usize {
            let src = row * stride;
            let dst = (rect.y as usize + row) * dst_stride + rect.x as usize * bpp;
            self.pixels[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }

        Ok(())
    }

    fn read_back(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    fn read_rect(&self, rect: Rect) -> Result<Vec<u8>, MosaicError> {
        check_bounds(rect, self.width, self.height)?;
        Ok(copy_rect(&self.pixels, self.width, self.depth, rect))
    }
}
