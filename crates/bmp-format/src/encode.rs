use std::io::{Cursor, Seek, SeekFrom, Write};

use crate::image::{BitDepth, Image};
use crate::EncodeError;

/// Encode `image` into `sink`.
///
/// Writes the file header, the info header, the palette (8-bit images), then seeks to the
/// header's `data_offset` and writes the pixel buffer. This mirrors [`crate::decode`] exactly, so
/// decoding and re-encoding a file reproduces its bytes.
pub fn encode<W: Write + Seek>(image: &Image, mut sink: W) -> Result<(), EncodeError> {
    image
        .file_header()
        .write_to(&mut sink)
        .map_err(write_err("BMP file header"))?;
    image
        .info_header()
        .write_to(&mut sink)
        .map_err(write_err("BMP info header"))?;

    if let (BitDepth::Indexed8, Some(palette)) = (image.bit_depth(), image.palette()) {
        palette
            .write_to(&mut sink)
            .map_err(write_err("BMP palette"))?;
    }

    sink.seek(SeekFrom::Start(u64::from(image.file_header().data_offset)))
        .map_err(write_err("BMP pixel data offset"))?;
    sink.write_all(image.pixels())
        .map_err(write_err("BMP pixel data"))?;
    sink.flush().map_err(write_err("BMP pixel data"))?;
    Ok(())
}

fn write_err(context: &'static str) -> impl FnOnce(std::io::Error) -> EncodeError {
    move |source| EncodeError::Write { context, source }
}

/// Encode `image` into an in-memory buffer.
pub fn encode_to_vec(image: &Image) -> Result<Vec<u8>, EncodeError> {
    let mut cursor = Cursor::new(Vec::with_capacity(
        image.file_header().data_offset as usize + image.image_size(),
    ));
    encode(image, &mut cursor)?;
    Ok(cursor.into_inner())
}
