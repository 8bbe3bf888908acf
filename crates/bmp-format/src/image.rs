use std::io::Write;

use crate::header::{FileHeader, InfoHeader, BMP_SIGNATURE, INFO_HEADER_SIZE};
use crate::layout::PixelLayout;
use crate::FormatError;

/// Number of entries in an 8-bit palette.
pub const PALETTE_LEN: usize = 256;
/// Size of an 8-bit palette on disk.
pub const PALETTE_BYTES: usize = PALETTE_LEN * 4;

// 72 DPI, the value most encoders write.
const DEFAULT_PIXELS_PER_METER: i32 = 2835;

/// Supported pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// One byte per pixel, indexing a 256-entry palette.
    Indexed8,
    /// Three bytes per pixel in blue, green, red order.
    Bgr24,
}

impl BitDepth {
    pub fn from_bit_count(bit_count: u16) -> Option<Self> {
        match bit_count {
            8 => Some(BitDepth::Indexed8),
            24 => Some(BitDepth::Bgr24),
            _ => None,
        }
    }

    pub fn bit_count(self) -> u16 {
        match self {
            BitDepth::Indexed8 => 8,
            BitDepth::Bgr24 => 24,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        u32::from(self.bit_count() / 8)
    }
}

/// Storage order of the rows in the pixel buffer, derived from the sign of the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowOrder {
    /// Positive height: the first stored row is the bottom scan line.
    BottomUp,
    /// Negative height: the first stored row is the top scan line.
    TopDown,
}

impl RowOrder {
    pub fn from_height(height: i32) -> Self {
        if height < 0 {
            RowOrder::TopDown
        } else {
            RowOrder::BottomUp
        }
    }
}

/// A resolved pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bgr {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

/// One `RGBQUAD` palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PaletteEntry {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

impl PaletteEntry {
    pub fn color(&self) -> Bgr {
        Bgr {
            blue: self.blue,
            green: self.green,
            red: self.red,
        }
    }
}

/// The 256-entry color table of an 8-bit image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [PaletteEntry; PALETTE_LEN],
}

impl Palette {
    pub fn new(entries: [PaletteEntry; PALETTE_LEN]) -> Self {
        Self { entries }
    }

    /// A palette mapping index `i` to the gray color `(i, i, i)`.
    pub fn grayscale() -> Self {
        let mut entries = [PaletteEntry::default(); PALETTE_LEN];
        for (value, entry) in (0..=u8::MAX).zip(entries.iter_mut()) {
            *entry = PaletteEntry {
                blue: value,
                green: value,
                red: value,
                reserved: 0,
            };
        }
        Self { entries }
    }

    pub fn from_bytes(bytes: &[u8; PALETTE_BYTES]) -> Self {
        let mut entries = [PaletteEntry::default(); PALETTE_LEN];
        for (entry, quad) in entries.iter_mut().zip(bytes.chunks_exact(4)) {
            *entry = PaletteEntry {
                blue: quad[0],
                green: quad[1],
                red: quad[2],
                reserved: quad[3],
            };
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PaletteEntry; PALETTE_LEN] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PaletteEntry; PALETTE_LEN] {
        &mut self.entries
    }

    /// Color of palette index `index`. Every `u8` is a valid index.
    pub fn color(&self, index: u8) -> Bgr {
        self.entries[usize::from(index)].color()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut bytes = Vec::with_capacity(PALETTE_BYTES);
        for entry in &self.entries {
            bytes.extend_from_slice(&[entry.blue, entry.green, entry.red, entry.reserved]);
        }
        writer.write_all(&bytes)
    }
}

/// A decoded BMP image.
///
/// The headers are kept exactly as decoded so the image can be re-encoded byte for byte. The
/// pixel buffer holds the resolved image-data size (`InfoHeader::image_size`, or the layout size
/// when the header declares 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub(crate) file_header: FileHeader,
    pub(crate) info_header: InfoHeader,
    pub(crate) bit_depth: BitDepth,
    pub(crate) layout: PixelLayout,
    pub(crate) palette: Option<Palette>,
    pub(crate) pixels: Vec<u8>,
}

impl Image {
    pub(crate) fn from_decoded(
        file_header: FileHeader,
        info_header: InfoHeader,
        bit_depth: BitDepth,
        palette: Option<Palette>,
        pixels: Vec<u8>,
    ) -> Self {
        let layout = PixelLayout::for_header(&info_header, bit_depth);
        Self {
            file_header,
            info_header,
            bit_depth,
            layout,
            palette,
            pixels,
        }
    }

    /// Build a 24-bit image. `pixels` must hold exactly `stride * |height|` bytes.
    pub fn new_bgr24(width: u32, height: i32, pixels: Vec<u8>) -> Result<Self, FormatError> {
        Self::build(BitDepth::Bgr24, width, height, None, pixels)
    }

    /// Build an 8-bit image. `pixels` must hold exactly `stride * |height|` bytes.
    pub fn new_indexed8(
        width: u32,
        height: i32,
        palette: Palette,
        pixels: Vec<u8>,
    ) -> Result<Self, FormatError> {
        Self::build(BitDepth::Indexed8, width, height, Some(palette), pixels)
    }

    fn build(
        bit_depth: BitDepth,
        width: u32,
        height: i32,
        palette: Option<Palette>,
        pixels: Vec<u8>,
    ) -> Result<Self, FormatError> {
        let signed_width = i32::try_from(width).map_err(|_| FormatError::InvalidWidth {
            width: i64::from(width),
        })?;
        let layout = PixelLayout::new(width, height, bit_depth);
        let expected = layout.derived_image_size();
        if pixels.len() as u64 != expected {
            return Err(FormatError::BufferLengthMismatch {
                expected,
                got: pixels.len() as u64,
            });
        }

        let palette_len = if palette.is_some() { PALETTE_BYTES } else { 0 };
        let data_offset = (FileHeader::LEN + InfoHeader::LEN + palette_len) as u32;
        let (image_size, file_size) = u32::try_from(expected)
            .ok()
            .and_then(|size| Some((size, size.checked_add(data_offset)?)))
            .ok_or(FormatError::SizeMismatch {
                image_size: expected,
                file_size: u32::MAX,
            })?;

        let file_header = FileHeader {
            signature: BMP_SIGNATURE,
            file_size,
            reserved: 0,
            data_offset,
        };
        let info_header = InfoHeader {
            size: INFO_HEADER_SIZE,
            width: signed_width,
            height,
            planes: 1,
            bit_count: bit_depth.bit_count(),
            compression: 0,
            image_size,
            x_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            y_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            colors_used: if palette.is_some() { PALETTE_LEN as u32 } else { 0 },
            colors_important: 0,
        };

        Ok(Self {
            file_header,
            info_header,
            bit_depth,
            layout,
            palette,
            pixels,
        })
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.info_header
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.layout.width()
    }

    /// Number of rows, i.e. `|height|`.
    pub fn height(&self) -> u32 {
        self.layout.rows()
    }

    pub fn row_order(&self) -> RowOrder {
        RowOrder::from_height(self.info_header.height)
    }

    /// Resolved size of the pixel data in bytes.
    pub fn image_size(&self) -> usize {
        self.pixels.len()
    }

    /// Bytes of the pixel at column `x` of the stored row `physical_row`.
    ///
    /// Returns `None` when the position is outside the image or past the end of a pixel buffer
    /// shorter than its layout.
    pub fn pixel_bytes(&self, x: u32, physical_row: u32) -> Option<&[u8]> {
        let start = self.layout.pixel_offset(x, physical_row)?;
        let len = self.bit_depth.bytes_per_pixel() as usize;
        self.pixels.get(start..start.checked_add(len)?)
    }

    /// Reverse the stored row order and negate the height.
    ///
    /// Every logical (top-to-bottom) row keeps its pixels; only the storage order changes. The
    /// declared header sizes are left as they are.
    pub fn flip_row_order(&mut self) -> Result<(), FormatError> {
        let height = self.info_header.height;
        let flipped_height = height
            .checked_neg()
            .ok_or(FormatError::InvalidHeight { height })?;

        let expected = self.layout.derived_image_size();
        let got = self.pixels.len() as u64;
        if got < expected {
            return Err(FormatError::TruncatedPixelData { expected, got });
        }

        let stride = self.layout.stride() as usize;
        let rows = self.layout.rows() as usize;
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (head, tail) = self.pixels.split_at_mut(bottom * stride);
            head[top * stride..(top + 1) * stride].swap_with_slice(&mut tail[..stride]);
        }

        self.info_header.height = flipped_height;
        Ok(())
    }
}
