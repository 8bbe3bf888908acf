//! Pixel-level comparison of BMP images.
//!
//! Two images are compared by what they show, not by how they are stored:
//! - rows are matched top to bottom regardless of each image's own row order
//! - 8-bit pixels are resolved through each image's own palette before comparing
//! - row padding and palette entries that no pixel uses are ignored

pub mod cli;

use std::fmt;
use std::ops::Range;

use bmp_format::{BitDepth, Bgr, Image, RowOrder};
use serde::Serialize;

/// Number of differing pixels after which a comparison stops.
pub const DEFAULT_MAX_DIFFERENCES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// A comparison stops and reports [`Comparison::TooManyDifferences`] once this many
    /// differing pixels have been found.
    pub max_differences: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            max_differences: DEFAULT_MAX_DIFFERENCES,
        }
    }
}

/// A pixel position in logical space: `y == 0` is the top scan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PixelPosition {
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for PixelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    /// Every differing pixel, in scan order.
    Differs(Vec<PixelPosition>),
    /// The first `max_differences` differing pixels, in scan order; the scan stopped there.
    TooManyDifferences(Vec<PixelPosition>),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    pub fn positions(&self) -> &[PixelPosition] {
        match self {
            Comparison::Equal => &[],
            Comparison::Differs(positions) | Comparison::TooManyDifferences(positions) => {
                positions
            }
        }
    }
}

/// Images that cannot be compared pixel by pixel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComparisonError {
    #[error("bit depth mismatch: {left} vs {right}")]
    BitDepthMismatch { left: u16, right: u16 },

    #[error("width mismatch: {left} vs {right}")]
    WidthMismatch { left: u32, right: u32 },

    #[error("height mismatch: {left} vs {right}")]
    HeightMismatch { left: u32, right: u32 },
}

/// Stored row index of logical row `logical_row` (0 = top) in an image of height `height`.
///
/// Bottom-up images (positive height) store the top scan line last; top-down images (negative
/// height) store it first. `logical_row` must be less than `|height|`.
pub fn physical_row(height: i32, logical_row: u32) -> u32 {
    let rows = height.unsigned_abs();
    debug_assert!(logical_row < rows, "row {logical_row} out of range for {rows} rows");
    match RowOrder::from_height(height) {
        RowOrder::TopDown => logical_row,
        RowOrder::BottomUp => rows.saturating_sub(1).saturating_sub(logical_row),
    }
}

/// Compare two images with [`CompareOptions::default`].
pub fn compare(left: &Image, right: &Image) -> Result<Comparison, ComparisonError> {
    compare_with_options(left, right, &CompareOptions::default())
}

pub fn compare_with_options(
    left: &Image,
    right: &Image,
    options: &CompareOptions,
) -> Result<Comparison, ComparisonError> {
    check_compatible(left, right)?;

    let left_height = left.info_header().height;
    let right_height = right.info_header().height;
    let mut differences = Vec::new();

    for rows in scan_ranges(stored_rows(left), stored_rows(right)) {
        for y in rows {
            let left_row = physical_row(left_height, y);
            let right_row = physical_row(right_height, y);
            // Past the stored pixels of both rows every position is missing on both sides.
            let columns = stored_pixels(left, left_row).max(stored_pixels(right, right_row));
            for x in 0..columns {
                let left_pixel = pixel_color(left, x, left_row);
                let right_pixel = pixel_color(right, x, right_row);
                if !pixels_differ(left_pixel, right_pixel) {
                    continue;
                }

                if options.max_differences == 0 {
                    return Ok(Comparison::TooManyDifferences(differences));
                }
                differences.push(PixelPosition { x, y });
                if differences.len() >= options.max_differences {
                    log::debug!(
                        "stopping comparison at ({x}, {y}) after {} differences",
                        differences.len()
                    );
                    return Ok(Comparison::TooManyDifferences(differences));
                }
            }
        }
    }

    if differences.is_empty() {
        Ok(Comparison::Equal)
    } else {
        Ok(Comparison::Differs(differences))
    }
}

/// Logical rows with at least one stored byte. A pixel buffer shorter than its layout is missing
/// the rows stored last, which are the top rows of a bottom-up image.
fn stored_rows(image: &Image) -> Range<u32> {
    let layout = image.layout();
    let rows = layout.rows();
    let stored = match layout.stride() {
        0 => 0,
        stride => {
            let len = image.pixels().len() as u64;
            u32::try_from(len.div_ceil(stride)).map_or(rows, |stored| stored.min(rows))
        }
    };
    match image.row_order() {
        RowOrder::TopDown => 0..stored,
        RowOrder::BottomUp => rows - stored..rows,
    }
}

/// Union of two row ranges in scan order.
fn scan_ranges(a: Range<u32>, b: Range<u32>) -> Vec<Range<u32>> {
    let mut ranges: Vec<Range<u32>> = [a, b].into_iter().filter(|r| !r.is_empty()).collect();
    ranges.sort_by_key(|r| r.start);
    if let [first, second] = ranges.as_slice() {
        if second.start <= first.end {
            return vec![first.start..first.end.max(second.end)];
        }
    }
    ranges
}

/// Number of whole pixels present in stored row `physical_row`.
fn stored_pixels(image: &Image, physical_row: u32) -> u32 {
    let layout = image.layout();
    let len = image.pixels().len();
    match layout.row_range(physical_row) {
        Some(range) if range.start < len => {
            let present = (len - range.start) as u64 / u64::from(layout.bytes_per_pixel());
            present.min(u64::from(layout.width())) as u32
        }
        _ => 0,
    }
}

fn check_compatible(left: &Image, right: &Image) -> Result<(), ComparisonError> {
    if left.bit_depth() != right.bit_depth() {
        return Err(ComparisonError::BitDepthMismatch {
            left: left.bit_depth().bit_count(),
            right: right.bit_depth().bit_count(),
        });
    }
    if left.width() != right.width() {
        return Err(ComparisonError::WidthMismatch {
            left: left.width(),
            right: right.width(),
        });
    }
    if left.height() != right.height() {
        return Err(ComparisonError::HeightMismatch {
            left: left.height(),
            right: right.height(),
        });
    }
    Ok(())
}

/// Color of a stored pixel; `None` past the end of a short pixel buffer.
fn pixel_color(image: &Image, x: u32, physical_row: u32) -> Option<Bgr> {
    match (image.bit_depth(), image.pixel_bytes(x, physical_row)?) {
        (BitDepth::Bgr24, &[blue, green, red]) => Some(Bgr { blue, green, red }),
        (BitDepth::Indexed8, &[index]) => image.palette().map(|palette| palette.color(index)),
        _ => None,
    }
}

fn pixels_differ(left: Option<Bgr>, right: Option<Bgr>) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => ((a.blue ^ b.blue) | (a.green ^ b.green) | (a.red ^ b.red)) != 0,
        (None, None) => false,
        _ => true,
    }
}
