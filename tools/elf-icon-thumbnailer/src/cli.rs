//! Command-line interface definitions for the thumbnailer.

use std::path::PathBuf;

use clap::Parser;

/// Desktop entry that registers this tool as a thumbnailer.
///
/// `%s` is the requested thumbnail size, `%i` the input path and `%o` the
/// output path.
pub const THUMBNAILER_ENTRY: &str = "\
[Thumbnailer Entry]
TryExec=elf-icon-thumbnailer
Exec=elf-icon-thumbnailer %s %i %o
MimeType=application/x-executable;application/x-pie-executable;";

/// Extract the PNG icon embedded in an ELF executable.
///
/// Writes the icon whose height equals SIZE, or the tallest icon if there is
/// no exact match, verbatim to OUTPUT.
#[derive(Parser, Debug)]
#[command(name = "elf-icon-thumbnailer", version, about, after_help = THUMBNAILER_ENTRY)]
pub struct Cli {
    /// Requested thumbnail height in pixels.
    #[arg(value_parser = parse_size, required_unless_present = "print_entry")]
    pub size: Option<u32>,

    /// ELF executable to read.
    #[arg(required_unless_present = "print_entry")]
    pub input: Option<PathBuf>,

    /// PNG file to write.
    #[arg(required_unless_present = "print_entry")]
    pub output: Option<PathBuf>,

    /// Print the thumbnailer desktop entry and exit.
    #[arg(long, exclusive = true)]
    pub print_entry: bool,

    /// Print errors only.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report the ELF header, every section and timings on stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// A fully specified thumbnail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Requested icon height.
    pub size: u32,
    /// Input executable.
    pub input: PathBuf,
    /// Output PNG file.
    pub output: PathBuf,
}

impl Cli {
    /// Returns the thumbnail request, or `None` when `--print-entry` was given.
    pub fn job(&self) -> Option<Job> {
        Some(Job {
            size: self.size?,
            input: self.input.clone()?,
            output: self.output.clone()?,
        })
    }
}

/// Parse a thumbnail size: a decimal `u32` below `u32::MAX`.
fn parse_size(s: &str) -> Result<u32, String> {
    let size: u32 = s.parse().map_err(|e| format!("invalid size `{s}`: {e}"))?;
    if size == u32::MAX {
        return Err(format!("size `{s}` out of range"));
    }
    Ok(size)
}
