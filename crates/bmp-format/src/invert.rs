use crate::image::{BitDepth, Image};
use crate::InvertError;

/// Complement every color channel of `image` in place.
///
/// 8-bit images are inverted through their palette (the reserved byte is left alone); 24-bit
/// images are inverted pixel by pixel, skipping row padding. Applying this twice restores the
/// original bytes.
pub fn invert(image: &mut Image) -> Result<(), InvertError> {
    match image.bit_depth {
        BitDepth::Indexed8 => {
            let palette = image
                .palette
                .as_mut()
                .ok_or(InvertError::UnsupportedBitDepth {
                    bit_count: image.info_header.bit_count,
                })?;
            for entry in palette.entries_mut().iter_mut() {
                entry.blue = !entry.blue;
                entry.green = !entry.green;
                entry.red = !entry.red;
            }
        }
        BitDepth::Bgr24 => {
            let layout = image.layout;
            let len = image.pixels.len();
            for row in 0..layout.rows() {
                let Some(range) = layout.row_range(row) else {
                    break;
                };
                // A declared image size shorter than the layout leaves the tail rows missing.
                if range.start >= len {
                    break;
                }
                let end = range.end.min(len);
                for pixel in image.pixels[range.start..end].chunks_exact_mut(3) {
                    for channel in pixel {
                        *channel = !*channel;
                    }
                }
            }
        }
    }
    Ok(())
}
