use std::io::Cursor;

use bmp_format::{decode, BitDepth, Bgr, DecodeError, FormatError, RowOrder};
use pretty_assertions::assert_eq;

fn palette_bytes() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1024);
    for i in 0..=255u8 {
        bytes.extend_from_slice(&[i, 255 - i, i / 2, 0]);
    }
    bytes
}

/// Build a BMP file by hand. 8-bit images get a 256-entry palette; `gap` bytes of 0xEE are placed
/// between the palette (or info header) and the pixel data.
fn bmp_bytes(
    bit_count: u16,
    width: i32,
    height: i32,
    declared_image_size: u32,
    gap: usize,
    pixels: &[u8],
) -> Vec<u8> {
    let palette = if bit_count == 8 { palette_bytes() } else { Vec::new() };
    let data_offset = (14 + 40 + palette.len() + gap) as u32;
    let file_size = data_offset + pixels.len() as u32;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes()); // reserved
    bytes.extend_from_slice(&data_offset.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes()); // size
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // planes
    bytes.extend_from_slice(&bit_count.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes()); // compression
    bytes.extend_from_slice(&declared_image_size.to_le_bytes());
    bytes.extend_from_slice(&2835i32.to_le_bytes());
    bytes.extend_from_slice(&2835i32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes()); // colorsUsed
    bytes.extend_from_slice(&0u32.to_le_bytes()); // colorsImportant

    bytes.extend_from_slice(&palette);
    bytes.extend(std::iter::repeat(0xEE).take(gap));
    bytes.extend_from_slice(pixels);
    bytes
}

// 3x2 24-bit: 9 bytes of pixels + 3 bytes of padding per row.
fn pixels_3x2_bgr() -> Vec<u8> {
    vec![
        1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 0, 0, //
        10, 11, 12, 13, 14, 15, 16, 17, 18, 0, 0, 0,
    ]
}

fn format_error(err: DecodeError) -> FormatError {
    err.format_error()
        .cloned()
        .unwrap_or_else(|| panic!("expected a format error, got {err:?}"))
}

#[test]
fn decodes_24bit_bottom_up_image() {
    let bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    let image = decode(Cursor::new(bytes)).expect("decode");

    assert_eq!(image.bit_depth(), BitDepth::Bgr24);
    assert_eq!(image.width(), 3);
    assert_eq!(image.height(), 2);
    assert_eq!(image.row_order(), RowOrder::BottomUp);
    assert_eq!(image.layout().stride(), 12);
    assert!(image.palette().is_none());
    assert_eq!(image.pixels(), pixels_3x2_bgr().as_slice());
    assert_eq!(image.pixel_bytes(2, 1), Some(&[16u8, 17, 18][..]));
}

#[test]
fn decodes_8bit_image_with_palette() {
    // 2x2 8-bit: stride 4.
    let pixels = [0u8, 255, 0, 0, 7, 9, 0, 0];
    let bytes = bmp_bytes(8, 2, -2, 0, 0, &pixels);
    let image = decode(Cursor::new(bytes)).expect("decode");

    assert_eq!(image.bit_depth(), BitDepth::Indexed8);
    assert_eq!(image.row_order(), RowOrder::TopDown);
    let palette = image.palette().expect("8-bit images carry a palette");
    assert_eq!(palette.entries().len(), 256);
    assert_eq!(
        palette.color(255),
        Bgr {
            blue: 255,
            green: 0,
            red: 127
        }
    );
    assert_eq!(image.pixels(), &pixels);
}

#[test]
fn zero_image_size_is_derived_but_header_is_kept() {
    let bytes = bmp_bytes(24, 3, -2, 0, 0, &pixels_3x2_bgr());
    let image = decode(Cursor::new(bytes)).expect("decode");
    assert_eq!(image.image_size(), 24);
    assert_eq!(image.info_header().image_size, 0);
}

#[test]
fn declared_image_size_is_trusted() {
    let mut pixels = pixels_3x2_bgr();
    pixels.extend_from_slice(&[0xAA; 8]);
    let bytes = bmp_bytes(24, 3, 2, 32, 0, &pixels);
    let image = decode(Cursor::new(bytes)).expect("decode");
    assert_eq!(image.image_size(), 32);
    assert_eq!(image.pixels(), pixels.as_slice());
}

#[test]
fn pixel_data_is_read_from_data_offset() {
    let bytes = bmp_bytes(8, 2, 2, 8, 16, &[1, 2, 0, 0, 3, 4, 0, 0]);
    let image = decode(Cursor::new(bytes)).expect("decode");
    assert_eq!(image.file_header().data_offset, 14 + 40 + 1024 + 16);
    assert_eq!(image.pixels(), &[1, 2, 0, 0, 3, 4, 0, 0]);
}

#[test]
fn bad_signature_is_rejected() {
    let mut bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    bytes[0] = b'P';
    bytes[1] = b'K';
    let err = decode(Cursor::new(bytes)).expect_err("bad signature");
    assert_eq!(format_error(err), FormatError::BadSignature { found: 0x4B50 });
}

#[test]
fn unsupported_header_version_is_rejected() {
    let mut bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    bytes[14..18].copy_from_slice(&124u32.to_le_bytes());
    let err = decode(Cursor::new(bytes)).expect_err("BITMAPV5HEADER");
    assert_eq!(
        format_error(err),
        FormatError::UnsupportedHeaderVersion { size: 124 }
    );
}

#[test]
fn unsupported_bit_depth_is_rejected() {
    let mut bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    bytes[28..30].copy_from_slice(&32u16.to_le_bytes());
    let err = decode(Cursor::new(bytes)).expect_err("32-bit");
    assert_eq!(
        format_error(err),
        FormatError::UnsupportedBitDepth { bit_count: 32 }
    );
}

#[test]
fn compressed_image_is_rejected() {
    let mut bytes = bmp_bytes(8, 2, 2, 8, 0, &[0u8; 8]);
    bytes[30..34].copy_from_slice(&1u32.to_le_bytes()); // BI_RLE8
    let err = decode(Cursor::new(bytes)).expect_err("RLE8");
    assert_eq!(
        format_error(err),
        FormatError::CompressedFormat { compression: 1 }
    );
}

#[test]
fn image_size_larger_than_file_size_is_rejected() {
    let mut bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    bytes[2..6].copy_from_slice(&20u32.to_le_bytes());
    let err = decode(Cursor::new(bytes)).expect_err("size mismatch");
    assert_eq!(
        format_error(err),
        FormatError::SizeMismatch {
            image_size: 24,
            file_size: 20
        }
    );
}

#[test]
fn short_palette_is_rejected() {
    let bytes = bmp_bytes(8, 2, 2, 8, 0, &[0u8; 8]);
    let truncated = bytes[..14 + 40 + 100].to_vec();
    let err = decode(Cursor::new(truncated)).expect_err("short palette");
    assert_eq!(
        format_error(err),
        FormatError::PaletteSizeMismatch { entries: 25 }
    );
}

#[test]
fn short_pixel_data_is_rejected() {
    let bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    let truncated = bytes[..bytes.len() - 5].to_vec();
    let err = decode(Cursor::new(truncated)).expect_err("short pixel data");
    assert_eq!(
        format_error(err),
        FormatError::TruncatedPixelData {
            expected: 24,
            got: 19
        }
    );
}

#[test]
fn short_info_header_is_an_io_error() {
    let bytes = bmp_bytes(24, 3, 2, 24, 0, &pixels_3x2_bgr());
    let err = decode(Cursor::new(bytes[..30].to_vec())).expect_err("short header");
    match err {
        DecodeError::Io { context, source } => {
            assert_eq!(context, "BMP info header");
            assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn open_reads_from_disk_and_names_missing_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("image.bmp");
    std::fs::write(&path, bmp_bytes(24, 3, 2, 0, 0, &pixels_3x2_bgr())).expect("write fixture");

    let image = bmp_format::open(&path).expect("open");
    assert_eq!(image.width(), 3);

    let missing = dir.path().join("missing.bmp");
    let err = bmp_format::open(&missing).expect_err("missing file");
    assert!(matches!(err, DecodeError::Open { ref path, .. } if path == &missing));
    assert!(err.to_string().contains("missing.bmp"));
}
