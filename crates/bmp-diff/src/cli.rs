use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::{CompareOptions, Comparison, PixelPosition, DEFAULT_MAX_DIFFERENCES};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(about = "Compare two 8-bit or 24-bit BMP images pixel by pixel.")]
pub struct Args {
    /// First image.
    left: PathBuf,

    /// Second image.
    right: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Stop after this many differing pixels and exit with status 2.
    #[arg(long, default_value_t = DEFAULT_MAX_DIFFERENCES)]
    max_diffs: usize,
}

/// Result of a successful run, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Equal,
    Differs,
    TooManyDifferences,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Equal => 0,
            Outcome::Differs => 1,
            Outcome::TooManyDifferences => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Outcome::Equal => "equal",
            Outcome::Differs => "differs",
            Outcome::TooManyDifferences => "too-many-differences",
        }
    }
}

impl From<&Comparison> for Outcome {
    fn from(comparison: &Comparison) -> Self {
        match comparison {
            Comparison::Equal => Outcome::Equal,
            Comparison::Differs(_) => Outcome::Differs,
            Comparison::TooManyDifferences(_) => Outcome::TooManyDifferences,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    left: &'a str,
    right: &'a str,
    verdict: &'static str,
    max_differences: usize,
    differences: &'a [PixelPosition],
}

pub fn run() -> Result<Outcome> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<Outcome> {
    let left = bmp_format::open(&args.left)
        .with_context(|| format!("read image {}", args.left.display()))?;
    let right = bmp_format::open(&args.right)
        .with_context(|| format!("read image {}", args.right.display()))?;

    let options = CompareOptions {
        max_differences: args.max_diffs,
    };
    let comparison = crate::compare_with_options(&left, &right, &options)?;
    let outcome = Outcome::from(&comparison);

    let written = match args.format {
        OutputFormat::Text => write_text(&comparison),
        OutputFormat::Json => {
            let left = args.left.to_string_lossy();
            let right = args.right.to_string_lossy();
            let report = JsonReport {
                left: &left,
                right: &right,
                verdict: outcome.label(),
                max_differences: options.max_differences,
                differences: comparison.positions(),
            };
            write_json(&report)
        }
    };
    // A closed stdout/stderr (e.g. `bmp_diff a b | head`) does not change the verdict.
    match written {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
        other => other.context("write comparison report")?,
    }

    Ok(outcome)
}

fn write_text(comparison: &Comparison) -> io::Result<()> {
    if comparison.is_equal() {
        let mut stdout = io::stdout().lock();
        return writeln!(stdout, "Images are same");
    }

    let mut stderr = io::stderr().lock();
    for position in comparison.positions() {
        writeln!(stderr, "{position}")?;
    }
    Ok(())
}

fn write_json(report: &JsonReport<'_>) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, report)?;
    stdout.write_all(b"\n")
}
