//! ELF file header interpretation.
//!
//! Resolves the ELF class and byte order from the identification bytes, then
//! reads the section header table location, the section count and the
//! section-name string table index, applying ELF's extended numbering rules.
//! All multi-byte fields go through [`Endian`], so the host byte order never
//! leaks into the result.

use core::fmt;

use crate::section::SectionHeader;

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Index of the class byte in `e_ident`.
const EI_CLASS: usize = 4;

/// Index of the data encoding byte in `e_ident`.
const EI_DATA: usize = 5;

/// ELF class: 32-bit.
pub const ELFCLASS32: u8 = 1;

/// ELF class: 64-bit.
pub const ELFCLASS64: u8 = 2;

/// ELF data encoding: little-endian.
pub const ELFDATA2LSB: u8 = 1;

/// ELF data encoding: big-endian.
pub const ELFDATA2MSB: u8 = 2;

/// `e_shstrndx` escape value: the real index lives in `sh_link` of entry 0.
pub const SHN_XINDEX: u16 = 0xffff;

/// Size of an ELF64 file header (64 bytes).
///
/// Used as the minimum buffer length for both classes.
pub const ELF64_EHDR_SIZE: usize = 64;

/// Errors that abort a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    /// The buffer is not a recognized ELF class/byte order combination.
    UnsupportedFormat,
    /// A header-level field (section header offset, section count,
    /// string table index or string table offset) failed validation.
    MalformedHeader,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "unsupported ELF class or byte order"),
            Self::MalformedHeader => write!(f, "malformed ELF section header table"),
        }
    }
}

impl core::error::Error for ScanError {}

/// Byte order recorded in `e_ident[EI_DATA]`.
///
/// The readers are bounds-checked and return `None` instead of panicking
/// when the field does not fit in `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// `ELFDATA2LSB`.
    Little,
    /// `ELFDATA2MSB`.
    Big,
}

impl Endian {
    fn from_ident(byte: u8) -> Option<Self> {
        match byte {
            ELFDATA2LSB => Some(Self::Little),
            ELFDATA2MSB => Some(Self::Big),
            _ => None,
        }
    }

    /// Read a `u16` in this byte order from `data` at `off`.
    #[must_use]
    pub fn read_u16(self, data: &[u8], off: usize) -> Option<u16> {
        let bytes = *data.get(off..)?.first_chunk()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Read a `u32` in this byte order from `data` at `off`.
    #[must_use]
    pub fn read_u32(self, data: &[u8], off: usize) -> Option<u32> {
        let bytes = *data.get(off..)?.first_chunk()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Read a `u64` in this byte order from `data` at `off`.
    #[must_use]
    pub fn read_u64(self, data: &[u8], off: usize) -> Option<u64> {
        let bytes = *data.get(off..)?.first_chunk()?;
        Some(match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        })
    }
}

/// Word size recorded in `e_ident[EI_CLASS]`.
///
/// Each class has its own file header and section header layout; the
/// offsets below are the ones defined by the System V gABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    /// `ELFCLASS32`.
    Elf32,
    /// `ELFCLASS64`.
    Elf64,
}

impl ElfClass {
    fn from_ident(byte: u8) -> Option<Self> {
        match byte {
            ELFCLASS32 => Some(Self::Elf32),
            ELFCLASS64 => Some(Self::Elf64),
            _ => None,
        }
    }

    /// Word size in bits (32 or 64).
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Elf32 => 32,
            Self::Elf64 => 64,
        }
    }

    /// Size of one section header entry in bytes.
    #[must_use]
    pub fn shdr_size(self) -> usize {
        match self {
            Self::Elf32 => 40,
            Self::Elf64 => 64,
        }
    }

    /// Read an address-sized field (`Elf32_Off` or `Elf64_Off`), widened to `u64`.
    pub(crate) fn read_word(self, endian: Endian, data: &[u8], off: usize) -> Option<u64> {
        match self {
            Self::Elf32 => endian.read_u32(data, off).map(u64::from),
            Self::Elf64 => endian.read_u64(data, off),
        }
    }

    /// Offset of `e_shoff` in the file header.
    fn e_shoff(self) -> usize {
        match self {
            Self::Elf32 => 32,
            Self::Elf64 => 40,
        }
    }

    /// Offset of `e_shnum` in the file header (`e_shstrndx` follows it).
    fn e_shnum(self) -> usize {
        match self {
            Self::Elf32 => 48,
            Self::Elf64 => 60,
        }
    }
}

/// The normalized view of an ELF file header needed to walk its sections.
///
/// `shnum` and `shstrndx` are always the resolved values; the extended
/// numbering escapes (`e_shnum == 0`, `e_shstrndx == SHN_XINDEX`) have
/// already been replaced by the values stored in section header entry 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfDescriptor {
    /// Word size of the file.
    pub class: ElfClass,
    /// Byte order of every ELF field in the file.
    pub endian: Endian,
    /// Offset of the section header table, `0 < shoff < data.len()`.
    pub shoff: usize,
    /// Number of section header entries.
    pub shnum: usize,
    /// Index of the section-name string table, `shstrndx < shnum`.
    pub shstrndx: usize,
}

impl ElfDescriptor {
    /// Interpret the ELF file header at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnsupportedFormat`] if `data` is shorter than an
    /// ELF64 header, lacks the ELF magic, or carries an unknown class or
    /// data encoding. Returns [`ScanError::MalformedHeader`] if the section
    /// header table offset is out of bounds, or if the resolved section
    /// count or string table index is invalid.
    pub fn parse(data: &[u8]) -> Result<Self, ScanError> {
        if data.len() < ELF64_EHDR_SIZE || data[..4] != ELF_MAGIC {
            return Err(ScanError::UnsupportedFormat);
        }

        let class = ElfClass::from_ident(data[EI_CLASS]).ok_or(ScanError::UnsupportedFormat)?;
        let endian = Endian::from_ident(data[EI_DATA]).ok_or(ScanError::UnsupportedFormat)?;

        // In bounds: `data` holds at least a full ELF64 header.
        let raw_shoff = class
            .read_word(endian, data, class.e_shoff())
            .ok_or(ScanError::MalformedHeader)?;
        let raw_shnum = endian
            .read_u16(data, class.e_shnum())
            .ok_or(ScanError::MalformedHeader)?;
        let raw_shstrndx = endian
            .read_u16(data, class.e_shnum() + 2)
            .ok_or(ScanError::MalformedHeader)?;

        let shoff = usize::try_from(raw_shoff)
            .ok()
            .filter(|&off| off > 0 && off < data.len())
            .ok_or(ScanError::MalformedHeader)?;

        let mut desc = Self {
            class,
            endian,
            shoff,
            shnum: usize::from(raw_shnum),
            shstrndx: usize::from(raw_shstrndx),
        };

        if raw_shnum == 0 || raw_shstrndx == SHN_XINDEX {
            let first = desc.section(data, 0).ok_or(ScanError::MalformedHeader)?;

            if raw_shnum == 0 {
                desc.shnum = usize::try_from(first.size)
                    .ok()
                    .filter(|&n| n != 0)
                    .ok_or(ScanError::MalformedHeader)?;
            }

            if raw_shstrndx == SHN_XINDEX {
                desc.shstrndx = usize::try_from(first.link)
                    .ok()
                    .filter(|&i| i != 0)
                    .ok_or(ScanError::MalformedHeader)?;
            }
        }

        if desc.shstrndx >= desc.shnum {
            return Err(ScanError::MalformedHeader);
        }

        Ok(desc)
    }

    /// File offset of section header entry `index`, if the whole entry lies
    /// within a buffer of `len` bytes.
    pub(crate) fn section_offset(&self, len: usize, index: usize) -> Option<usize> {
        let size = self.class.shdr_size();
        let start = index.checked_mul(size)?.checked_add(self.shoff)?;
        (start.checked_add(size)? <= len).then_some(start)
    }

    /// Number of section header entries that actually fit in a buffer of
    /// `len` bytes. Entries past this point cannot be read.
    pub(crate) fn readable_sections(&self, len: usize) -> usize {
        let available = len.saturating_sub(self.shoff) / self.class.shdr_size();
        self.shnum.min(available)
    }

    /// Read section header entry `index`.
    ///
    /// Returns `None` if the entry does not fit within `data`. The index is
    /// not checked against `shnum`, which lets header interpretation read
    /// entry 0 before the count is known.
    #[must_use]
    pub fn section(&self, data: &[u8], index: usize) -> Option<SectionHeader> {
        let at = self.section_offset(data.len(), index)?;
        SectionHeader::parse(data, self.class, self.endian, at)
    }
}
