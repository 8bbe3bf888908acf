use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(about = "Invert the colors of an 8-bit or 24-bit BMP image.")]
pub struct Args {
    /// Image to read.
    input: PathBuf,

    /// Where to write the inverted image (overwritten if it exists).
    output: PathBuf,
}

pub fn run() -> Result<()> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<()> {
    crate::invert_file(&args.input, &args.output)
}
