//! Uncompressed Windows BMP decoding and encoding.
//!
//! This crate currently supports:
//! - the 14-byte `BITMAPFILEHEADER` followed by a 40-byte `BITMAPINFOHEADER`
//! - 8-bit palette-indexed images (256-entry palette) and 24-bit BGR images
//! - bottom-up (positive height) and top-down (negative height) row order
//!
//! Compressed variants (RLE, bitfields) and other bit depths are rejected with a
//! [`FormatError`].
//!
//! Decoding followed by encoding reproduces the input bytes: headers are kept exactly as read
//! (including a declared image size of 0) and the pixel buffer is written back verbatim.

mod decode;
mod encode;
pub mod header;
mod image;
mod invert;
pub mod layout;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub use decode::decode;
pub use encode::{encode, encode_to_vec};
pub use header::{FileHeader, InfoHeader};
pub use image::{BitDepth, Bgr, Image, Palette, PaletteEntry, RowOrder};
pub use invert::invert;
pub use layout::PixelLayout;

/// Validation failures for BMP structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("bad BMP signature {found:#06x} (expected 0x4d42, \"BM\")")]
    BadSignature { found: u16 },

    #[error("unsupported DIB header size {size} (only the 40-byte BITMAPINFOHEADER is supported)")]
    UnsupportedHeaderVersion { size: u32 },

    #[error("unsupported bit depth {bit_count} (only 8-bit and 24-bit images are supported)")]
    UnsupportedBitDepth { bit_count: u16 },

    #[error("compressed BMP images are not supported (compression method {compression})")]
    CompressedFormat { compression: u32 },

    #[error("invalid image width {width}")]
    InvalidWidth { width: i64 },

    #[error("invalid image height {height}")]
    InvalidHeight { height: i32 },

    #[error("image data size {image_size} is larger than the file size {file_size}")]
    SizeMismatch { image_size: u64, file_size: u32 },

    #[error("palette size mismatch: expected 256 entries, got {entries}")]
    PaletteSizeMismatch { entries: usize },

    #[error("truncated pixel data: expected {expected} bytes, got {got}")]
    TruncatedPixelData { expected: u64, got: u64 },

    #[error("pixel buffer length {got} does not match the layout size {expected}")]
    BufferLengthMismatch { expected: u64, got: u64 },
}

/// Errors returned by [`decode`] and [`open`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to open image `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to allocate pixel buffer of size {size}")]
    Allocation { size: u64 },
}

impl DecodeError {
    /// The format validation that failed, if this is a format error.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            DecodeError::Format(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors returned by [`encode`] and [`save`].
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to create image `{path}`: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {context}: {source}")]
    Write {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by [`invert`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvertError {
    #[error("cannot invert image with bit depth {bit_count}")]
    UnsupportedBitDepth { bit_count: u16 },
}

/// Open and decode the BMP file at `path`.
///
/// The file handle lives only for the duration of the call.
pub fn open(path: impl AsRef<Path>) -> Result<Image, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode(BufReader::new(file))
}

/// Encode `image` into a new file at `path`, truncating any existing file.
pub fn save(image: &Image, path: impl AsRef<Path>) -> Result<(), EncodeError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| EncodeError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    encode(image, BufWriter::new(file))
}
