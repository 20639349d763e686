//! Icon extraction and output.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use elfpng::{ElfPng, IconRecord};

use crate::verbose::{self, Timer, dprintln, vprintln};

/// Extract the icon for `size` from `input` and write it to `output`.
///
/// Returns the record of the icon that was written.
pub fn write_thumbnail(input: &Path, output: &Path, size: u32) -> Result<IconRecord> {
    let data = elfpng::file::open_file(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let icons = {
        let _t = Timer::start("scan");
        let elf = ElfPng::parse(&data)
            .with_context(|| format!("failed to scan {}", input.display()))?;
        if verbose::is_verbose() {
            report(&elf);
        }
        elf.icons().collect::<Vec<_>>()
    };

    let Some(icon) = elfpng::icon::select_for_height(&icons, size) else {
        bail!("no icons found in {}", input.display());
    };
    if icon.height != size {
        dprintln!(
            "{}: no {size}px icon, using {}x{}",
            input.display(),
            icon.width,
            icon.height
        );
    }
    vprintln!(
        "selected {}x{} icon at {:#x} for size {size}",
        icon.width,
        icon.height,
        icon.offset
    );

    let png = icon
        .data(&data)
        .context("icon range outside the scanned file")?;
    write_output(output, png)?;

    Ok(*icon)
}

/// Write `bytes` to a new file at `path`.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_or_remove(file, path, bytes)
}

/// Write `bytes` through `out`, which was opened on `path`, removing `path`
/// again if writing fails.
fn write_or_remove<W: Write>(mut out: W, path: &Path, bytes: &[u8]) -> Result<()> {
    if let Err(err) = out.write_all(bytes).and_then(|()| out.flush()) {
        drop(out);
        let _ = fs::remove_file(path);
        return Err(err).with_context(|| format!("failed to write {}", path.display()));
    }

    Ok(())
}

/// Print the header descriptor and the verdict for every section.
fn report(elf: &ElfPng<'_>) {
    let desc = elf.descriptor();
    eprintln!(
        "ELF{} {:?}-endian: {} sections at {:#x}, names in section {}",
        desc.class.bits(),
        desc.endian,
        desc.shnum,
        desc.shoff,
        desc.shstrndx
    );

    for (index, verdict) in elf.inspect() {
        let name = elf
            .section_name(index)
            .map_or_else(|| "?".into(), String::from_utf8_lossy);
        match verdict {
            Ok(icon) => eprintln!(
                "  [{index:>3}] {name}: {}x{} PNG, {} bytes at {:#x}",
                icon.width, icon.height, icon.size, icon.offset
            ),
            Err(reason) => eprintln!("  [{index:>3}] {name}: skipped ({reason})"),
        }
    }
}
