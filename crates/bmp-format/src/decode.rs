use std::io::{Read, Seek, SeekFrom};

use crate::header::read_headers;
use crate::image::{BitDepth, Image, Palette, PALETTE_BYTES};
use crate::layout::PixelLayout;
use crate::{DecodeError, FormatError};

/// Decode a BMP image from a source positioned at the start of the file.
///
/// The palette (8-bit images only) is read immediately after the info header; the pixel data is
/// read from `data_offset`, which is not assumed to follow the palette.
pub fn decode<R: Read + Seek>(mut source: R) -> Result<Image, DecodeError> {
    let (file_header, info_header, bit_depth) = read_headers(&mut source)?;

    let layout = PixelLayout::for_header(&info_header, bit_depth);
    let image_size = layout.resolve_image_size(info_header.image_size);
    if image_size > u64::from(file_header.file_size) {
        return Err(FormatError::SizeMismatch {
            image_size,
            file_size: file_header.file_size,
        }
        .into());
    }
    if image_size < layout.derived_image_size() {
        log::warn!(
            "declared image size {image_size} is smaller than the {}x{} layout size {}; trailing rows are missing",
            layout.width(),
            layout.rows(),
            layout.derived_image_size()
        );
    }

    let palette = match bit_depth {
        BitDepth::Indexed8 => Some(read_palette(&mut source)?),
        BitDepth::Bgr24 => None,
    };

    let pixels = read_pixels(&mut source, file_header.data_offset, image_size)?;

    log::debug!(
        "decoded {}x{} {}-bit BMP ({:?}, stride {}, {} bytes of pixel data)",
        layout.width(),
        info_header.height,
        bit_depth.bit_count(),
        crate::RowOrder::from_height(info_header.height),
        layout.stride(),
        pixels.len()
    );

    Ok(Image::from_decoded(
        file_header,
        info_header,
        bit_depth,
        palette,
        pixels,
    ))
}

fn read_palette<R: Read>(source: &mut R) -> Result<Palette, DecodeError> {
    let mut bytes = Vec::with_capacity(PALETTE_BYTES);
    source
        .by_ref()
        .take(PALETTE_BYTES as u64)
        .read_to_end(&mut bytes)
        .map_err(|source| DecodeError::Io {
            context: "BMP palette",
            source,
        })?;

    let entries = bytes.len() / 4;
    let bytes: &[u8; PALETTE_BYTES] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| FormatError::PaletteSizeMismatch { entries })?;
    Ok(Palette::from_bytes(bytes))
}

fn read_pixels<R: Read + Seek>(
    source: &mut R,
    data_offset: u32,
    image_size: u64,
) -> Result<Vec<u8>, DecodeError> {
    let len = usize::try_from(image_size).map_err(|_| DecodeError::Allocation { size: image_size })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| DecodeError::Allocation { size: image_size })?;

    source
        .seek(SeekFrom::Start(u64::from(data_offset)))
        .map_err(|source| DecodeError::Io {
            context: "BMP pixel data offset",
            source,
        })?;
    source
        .take(image_size)
        .read_to_end(&mut pixels)
        .map_err(|source| DecodeError::Io {
            context: "BMP pixel data",
            source,
        })?;

    if pixels.len() < len {
        return Err(FormatError::TruncatedPixelData {
            expected: image_size,
            got: pixels.len() as u64,
        }
        .into());
    }
    Ok(pixels)
}
