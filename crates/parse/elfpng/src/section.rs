//! Section header entries and section name lookup.
//!
//! Only the four section header fields the icon scan needs are decoded:
//! the name offset, the file offset and size of the section data, and
//! `sh_link` (which entry 0 uses for extended numbering).

use crate::header::{ElfClass, Endian};

/// Section name prefix marking an embedded PNG icon.
pub const ICON_SECTION_PREFIX: &[u8] = b".png.";

/// Parsed section header entry, widened to the ELF64 field sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset into the section-name string table (`sh_name`).
    pub name: u32,
    /// File offset of the section data (`sh_offset`).
    pub offset: u64,
    /// Size of the section data in bytes (`sh_size`).
    pub size: u64,
    /// Associated section index (`sh_link`).
    pub link: u32,
}

impl SectionHeader {
    /// Parse a section header entry starting at `at`.
    ///
    /// Returns `None` unless the whole entry lies inside `data`.
    pub(crate) fn parse(data: &[u8], class: ElfClass, endian: Endian, at: usize) -> Option<Self> {
        let end = at.checked_add(class.shdr_size())?;
        let b = data.get(at..end)?;
        let (offset, size, link) = match class {
            ElfClass::Elf32 => (16, 20, 24),
            ElfClass::Elf64 => (24, 32, 40),
        };
        Some(Self {
            name: endian.read_u32(b, 0)?,
            offset: class.read_word(endian, b, offset)?,
            size: class.read_word(endian, b, size)?,
            link: endian.read_u32(b, link)?,
        })
    }
}

/// A NUL-terminated string table whose names may run to the end of the
/// enclosing buffer.
///
/// Lookups never assume a terminator exists: a name that reaches the end of
/// the data without a NUL byte is reported as missing.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Creates a string table over `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Looks up the name starting at byte `offset`, without its terminator.
    ///
    /// Returns `None` if the offset is out of bounds or no NUL byte follows
    /// it within the table.
    #[must_use]
    pub fn get(&self, offset: u32) -> Option<&'a [u8]> {
        let start = usize::try_from(offset).ok()?;
        let remaining = self.data.get(start..)?;
        let nul_pos = remaining.iter().position(|&b| b == 0)?;
        Some(&remaining[..nul_pos])
    }
}

/// Returns `true` if `name` is `.png.` followed by at least one more byte.
#[must_use]
pub fn is_icon_section_name(name: &[u8]) -> bool {
    name.len() > ICON_SECTION_PREFIX.len() && name.starts_with(ICON_SECTION_PREFIX)
}
