//! `BITMAPFILEHEADER` / `BITMAPINFOHEADER` codec.
//!
//! Both structures are packed little-endian records; they are read and written field by field so
//! the on-disk layout never depends on the in-memory layout of the Rust structs.

use std::io::{Read, Write};

use crate::image::BitDepth;
use crate::{DecodeError, FormatError};

/// `"BM"` read as a little-endian `u16`.
pub const BMP_SIGNATURE: u16 = 0x4D42;

/// The only supported DIB header size (`BITMAPINFOHEADER`).
pub const INFO_HEADER_SIZE: u32 = 40;

/// Parsed `BITMAPFILEHEADER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: u16,
    pub file_size: u32,
    pub reserved: u32,
    /// Absolute byte offset of the pixel data.
    pub data_offset: u32,
}

/// Parsed `BITMAPINFOHEADER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoHeader {
    pub size: u32,
    pub width: i32,
    /// Negative for top-down row order, positive for bottom-up.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    /// Declared pixel data size; 0 means "derive from the layout".
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }
}

struct FieldWriter<const N: usize> {
    bytes: [u8; N],
    pos: usize,
}

impl<const N: usize> FieldWriter<N> {
    fn new() -> Self {
        Self {
            bytes: [0u8; N],
            pos: 0,
        }
    }

    fn put<const M: usize>(mut self, field: [u8; M]) -> Self {
        self.bytes[self.pos..self.pos + M].copy_from_slice(&field);
        self.pos += M;
        self
    }

    fn u16(self, value: u16) -> Self {
        self.put(value.to_le_bytes())
    }

    fn u32(self, value: u32) -> Self {
        self.put(value.to_le_bytes())
    }

    fn i32(self, value: i32) -> Self {
        self.put(value.to_le_bytes())
    }

    fn finish(self) -> [u8; N] {
        debug_assert_eq!(self.pos, N, "header fields do not fill the record");
        self.bytes
    }
}

impl FileHeader {
    pub const LEN: usize = 14;

    /// Read the file header, checking the signature before anything else is consumed.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut signature = [0u8; 2];
        reader
            .read_exact(&mut signature)
            .map_err(|source| DecodeError::Io {
                context: "BMP signature",
                source,
            })?;
        let signature = u16::from_le_bytes(signature);
        if signature != BMP_SIGNATURE {
            return Err(FormatError::BadSignature { found: signature }.into());
        }

        let mut rest = [0u8; Self::LEN - 2];
        reader
            .read_exact(&mut rest)
            .map_err(|source| DecodeError::Io {
                context: "BMP file header",
                source,
            })?;
        let mut fields = FieldReader::new(&rest);
        Ok(Self {
            signature,
            file_size: fields.u32(),
            reserved: fields.u32(),
            data_offset: fields.u32(),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        FieldWriter::new()
            .u16(self.signature)
            .u32(self.file_size)
            .u32(self.reserved)
            .u32(self.data_offset)
            .finish()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

impl InfoHeader {
    pub const LEN: usize = 40;

    /// Read the raw info header. No validation happens here; see [`InfoHeader::validate`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut bytes = [0u8; Self::LEN];
        reader
            .read_exact(&mut bytes)
            .map_err(|source| DecodeError::Io {
                context: "BMP info header",
                source,
            })?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
        let mut fields = FieldReader::new(bytes);
        Self {
            size: fields.u32(),
            width: fields.i32(),
            height: fields.i32(),
            planes: fields.u16(),
            bit_count: fields.u16(),
            compression: fields.u32(),
            image_size: fields.u32(),
            x_pixels_per_meter: fields.i32(),
            y_pixels_per_meter: fields.i32(),
            colors_used: fields.u32(),
            colors_important: fields.u32(),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        FieldWriter::new()
            .u32(self.size)
            .i32(self.width)
            .i32(self.height)
            .u16(self.planes)
            .u16(self.bit_count)
            .u32(self.compression)
            .u32(self.image_size)
            .i32(self.x_pixels_per_meter)
            .i32(self.y_pixels_per_meter)
            .u32(self.colors_used)
            .u32(self.colors_important)
            .finish()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Check the header version, bit depth, compression and width, in that order.
    pub fn validate(&self) -> Result<BitDepth, FormatError> {
        if self.size != INFO_HEADER_SIZE {
            return Err(FormatError::UnsupportedHeaderVersion { size: self.size });
        }
        let bit_depth = BitDepth::from_bit_count(self.bit_count).ok_or(
            FormatError::UnsupportedBitDepth {
                bit_count: self.bit_count,
            },
        )?;
        if self.compression != 0 {
            return Err(FormatError::CompressedFormat {
                compression: self.compression,
            });
        }
        if self.width < 0 {
            return Err(FormatError::InvalidWidth {
                width: i64::from(self.width),
            });
        }
        Ok(bit_depth)
    }
}

/// Read and validate both headers from a source positioned at the start of the file.
pub fn read_headers<R: Read>(
    reader: &mut R,
) -> Result<(FileHeader, InfoHeader, BitDepth), DecodeError> {
    let file_header = FileHeader::read_from(reader)?;
    let info_header = InfoHeader::read_from(reader)?;
    let bit_depth = info_header.validate()?;
    Ok((file_header, info_header, bit_depth))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    fn info_header() -> InfoHeader {
        InfoHeader {
            size: INFO_HEADER_SIZE,
            width: 3,
            height: -2,
            planes: 1,
            bit_count: 24,
            compression: 0,
            image_size: 0,
            x_pixels_per_meter: 2835,
            y_pixels_per_meter: -1,
            colors_used: 0,
            colors_important: 0,
        }
    }

    #[test]
    fn file_header_fields_are_little_endian_and_packed() {
        let header = FileHeader {
            signature: BMP_SIGNATURE,
            file_size: 0x0102_0304,
            reserved: 0,
            data_offset: 54,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(&bytes[2..6], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[10..14], &[54, 0, 0, 0]);

        let parsed = FileHeader::read_from(&mut Cursor::new(bytes)).expect("parse");
        assert_eq!(parsed, header);
    }

    #[test]
    fn info_header_offsets_match_bitmapinfoheader() {
        let header = InfoHeader {
            image_size: 0x0A0B_0C0D,
            colors_important: 7,
            ..info_header()
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], &40u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(&bytes[36..40], &7u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-2i32).to_le_bytes());
        assert_eq!(&bytes[14..16], &24u16.to_le_bytes());
        assert_eq!(&bytes[28..32], &(-1i32).to_le_bytes());
        assert_eq!(InfoHeader::from_bytes(&bytes), header);
    }

    #[test]
    fn validate_reports_checks_in_order() {
        let mut header = info_header();
        header.size = 124;
        header.bit_count = 32;
        assert_eq!(
            header.validate(),
            Err(FormatError::UnsupportedHeaderVersion { size: 124 })
        );

        header.size = INFO_HEADER_SIZE;
        header.compression = 1;
        assert_eq!(
            header.validate(),
            Err(FormatError::UnsupportedBitDepth { bit_count: 32 })
        );

        header.bit_count = 8;
        assert_eq!(
            header.validate(),
            Err(FormatError::CompressedFormat { compression: 1 })
        );

        header.compression = 0;
        assert_eq!(header.validate(), Ok(BitDepth::Indexed8));
    }

    #[test]
    fn negative_width_is_rejected() {
        let mut header = info_header();
        header.width = -3;
        assert_eq!(
            header.validate(),
            Err(FormatError::InvalidWidth { width: -3 })
        );
    }

    #[test]
    fn bad_signature_stops_after_two_bytes() {
        let mut cursor = Cursor::new(b"PK\x03\x04 not a bitmap".to_vec());
        let err = FileHeader::read_from(&mut cursor).expect_err("signature should be rejected");
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::BadSignature { found: 0x4B50 })
        ));
        assert_eq!(cursor.position(), 2);
    }
}
