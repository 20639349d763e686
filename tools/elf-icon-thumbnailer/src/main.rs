//! Freedesktop thumbnailer for ELF executables with embedded PNG icons.
//!
//! Usage:
//!   elf-icon-thumbnailer <size> <input> <output>
//!   elf-icon-thumbnailer --print-entry
//!
//! Exits with a non-zero status if the input cannot be read or scanned,
//! holds no icons, or the output cannot be written.

mod cli;
mod thumbnail;
mod verbose;

use anyhow::Result;
use clap::Parser;

use crate::verbose::{Verbosity, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(Verbosity::from_flags(cli.quiet, cli.verbose));

    let Some(job) = cli.job() else {
        println!("{}", cli::THUMBNAILER_ENTRY);
        return Ok(());
    };

    let icon = thumbnail::write_thumbnail(&job.input, &job.output, job.size)?;
    vprintln!(
        "wrote {}x{} icon ({} bytes) to {}",
        icon.width,
        icon.height,
        icon.size,
        job.output.display()
    );

    Ok(())
}
