//! Row stride and pixel-buffer geometry.
//!
//! Every row of a BMP pixel array is padded to a multiple of 4 bytes. The same [`PixelLayout`]
//! is used by decoding, encoding, inversion and comparison, so all of them agree on where a pixel
//! lives in the buffer.
//!
//! Sizes are computed in `u64`: `width` and `|height|` both fit in 31 bits, so no product here can
//! overflow.

use std::ops::Range;

use crate::header::InfoHeader;
use crate::image::BitDepth;

/// Bytes of padding needed to bring a row of `row_size` bytes to a multiple of 4.
pub fn row_padding(row_size: u64) -> u64 {
    (4 - row_size % 4) % 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    width: u32,
    rows: u32,
    bytes_per_pixel: u32,
    row_size: u64,
    padding: u64,
    stride: u64,
}

impl PixelLayout {
    pub fn new(width: u32, height: i32, bit_depth: BitDepth) -> Self {
        let bytes_per_pixel = bit_depth.bytes_per_pixel();
        let row_size = u64::from(width) * u64::from(bytes_per_pixel);
        let padding = row_padding(row_size);
        Self {
            width,
            rows: height.unsigned_abs(),
            bytes_per_pixel,
            row_size,
            padding,
            stride: row_size + padding,
        }
    }

    /// Layout of an already validated header (non-negative width).
    pub fn for_header(header: &InfoHeader, bit_depth: BitDepth) -> Self {
        Self::new(header.width.max(0) as u32, header.height, bit_depth)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// `|height|`.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    /// Bytes of pixel data per row, excluding padding.
    pub fn row_size(&self) -> u64 {
        self.row_size
    }

    pub fn padding(&self) -> u64 {
        self.padding
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// `stride * |height|`.
    pub fn derived_image_size(&self) -> u64 {
        self.stride * u64::from(self.rows)
    }

    /// The image-data size to use for a header declaring `declared` bytes.
    ///
    /// A declared size of 0 is derived from the layout; any other value is taken as is.
    pub fn resolve_image_size(&self, declared: u32) -> u64 {
        if declared == 0 {
            self.derived_image_size()
        } else {
            u64::from(declared)
        }
    }

    /// Byte range of the pixels of stored row `physical_row`, padding excluded.
    pub fn row_range(&self, physical_row: u32) -> Option<Range<usize>> {
        if physical_row >= self.rows {
            return None;
        }
        let start = u64::from(physical_row) * self.stride;
        let end = start + self.row_size;
        Some(usize::try_from(start).ok()?..usize::try_from(end).ok()?)
    }

    /// Offset of the first byte of pixel `x` in stored row `physical_row`.
    pub fn pixel_offset(&self, x: u32, physical_row: u32) -> Option<usize> {
        if x >= self.width || physical_row >= self.rows {
            return None;
        }
        let offset = u64::from(physical_row) * self.stride
            + u64::from(x) * u64::from(self.bytes_per_pixel);
        usize::try_from(offset).ok()
    }
}
