//! Loading ELF files from disk.
//!
//! [`open_file`] reads a whole file and checks that it is plausibly an ELF
//! image before any scanning happens: correct magic, a known class and data
//! encoding, and a size above the ELF64 header size.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::vec::Vec;

use crate::header::{
    ELF_MAGIC, ELF64_EHDR_SIZE, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB,
};

/// Length of `e_ident`.
const EI_NIDENT: usize = 16;

/// Errors from [`open_file`].
#[derive(Debug)]
pub enum OpenError {
    /// The file could not be opened or read.
    Io(io::Error),
    /// The file does not start with the ELF magic, or its class or data
    /// encoding is not recognized.
    NotElf,
    /// The file is not larger than an ELF64 header.
    TooSmall,
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::NotElf => write!(f, "not an ELF file"),
            Self::TooSmall => write!(f, "file too small for an ELF header"),
        }
    }
}

impl std::error::Error for OpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::NotElf | Self::TooSmall => None,
        }
    }
}

impl From<io::Error> for OpenError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Returns `true` if `ident` is an ELF identification with a class and data
/// encoding the scanner understands.
#[must_use]
pub fn is_supported_ident(ident: &[u8]) -> bool {
    ident.len() >= EI_NIDENT
        && ident[..4] == ELF_MAGIC
        && matches!(ident[4], ELFCLASS32 | ELFCLASS64)
        && matches!(ident[5], ELFDATA2LSB | ELFDATA2MSB)
}

/// Read the ELF file at `path` into memory.
///
/// The identification bytes are checked before the rest of the file is
/// read, so a large non-ELF file is rejected cheaply.
///
/// # Errors
///
/// Returns [`OpenError::Io`] if the file cannot be read,
/// [`OpenError::NotElf`] if the identification bytes are wrong, and
/// [`OpenError::TooSmall`] if the file is not larger than an ELF64 header.
pub fn open_file(path: impl AsRef<Path>) -> Result<Vec<u8>, OpenError> {
    let mut file = File::open(path)?;

    let mut ident = [0u8; EI_NIDENT];
    match file.read_exact(&mut ident) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(OpenError::NotElf);
        }
        Err(err) => return Err(err.into()),
    }
    if !is_supported_ident(&ident) {
        return Err(OpenError::NotElf);
    }

    let mut data = ident.to_vec();
    file.read_to_end(&mut data)?;
    if data.len() <= ELF64_EHDR_SIZE {
        return Err(OpenError::TooSmall);
    }

    Ok(data)
}
