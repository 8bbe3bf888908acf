//! Color inversion of BMP files.

pub mod cli;

use std::path::Path;

use anyhow::{Context, Result};

/// Decode `input`, complement every color channel and write the result to `output`.
///
/// Nothing is written when decoding or inverting fails.
pub fn invert_file(input: &Path, output: &Path) -> Result<()> {
    let mut image =
        bmp_format::open(input).with_context(|| format!("read image {}", input.display()))?;
    bmp_format::invert(&mut image)
        .with_context(|| format!("invert image {}", input.display()))?;
    bmp_format::save(&image, output)
        .with_context(|| format!("write image {}", output.display()))?;
    log::debug!(
        "inverted {} -> {} ({}x{}, {}-bit)",
        input.display(),
        output.display(),
        image.width(),
        image.height(),
        image.bit_depth().bit_count()
    );
    Ok(())
}
