//! Icon section scanning.
//!
//! [`ElfPng`] is the main entry point: it interprets the file header,
//! resolves the section-name string table, and then walks the section header
//! table yielding one [`IconRecord`] per valid `.png.*` section.
//!
//! Only header-level problems are fatal. A damaged individual entry is
//! skipped so that valid icons elsewhere in the file are still found.

use core::fmt;

use crate::header::{ElfDescriptor, ScanError};
use crate::icon::IconRecord;
use crate::png::{self, MIN_PAYLOAD_SIZE};
use crate::section::{SectionHeader, StringTable, is_icon_section_name};

/// Why a section header entry produced no icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry is the section-name string table itself.
    StringTable,
    /// The name offset points past the end of the buffer, or the name has
    /// no NUL terminator before the end of the buffer.
    BadName,
    /// The name is not `.png.` followed by a suffix.
    NotIcon,
    /// The section data lies outside the buffer.
    DataOutOfBounds,
    /// The section is smaller than a PNG signature plus `IHDR` header.
    TooSmall,
    /// The section data does not start with a PNG signature and `IHDR` chunk.
    NotPng,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringTable => write!(f, "section name string table"),
            Self::BadName => write!(f, "unresolvable section name"),
            Self::NotIcon => write!(f, "not an icon section"),
            Self::DataOutOfBounds => write!(f, "section data out of bounds"),
            Self::TooSmall => write!(f, "section too small for a PNG header"),
            Self::NotPng => write!(f, "section data is not a PNG stream"),
        }
    }
}

impl core::error::Error for SkipReason {}

/// An ELF file that has passed header interpretation and string table
/// resolution, ready to be scanned for icons.
#[derive(Debug, Clone, Copy)]
pub struct ElfPng<'a> {
    data: &'a [u8],
    desc: ElfDescriptor,
    strtab: StringTable<'a>,
}

impl<'a> ElfPng<'a> {
    /// Interpret the ELF header in `data` and resolve its section-name
    /// string table.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnsupportedFormat`] or
    /// [`ScanError::MalformedHeader`] from header interpretation, and
    /// [`ScanError::MalformedHeader`] if the string table's section header
    /// or data offset lies outside `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self, ScanError> {
        let desc = ElfDescriptor::parse(data)?;

        let strtab_shdr = desc
            .section(data, desc.shstrndx)
            .ok_or(ScanError::MalformedHeader)?;
        let strtab_offset = usize::try_from(strtab_shdr.offset)
            .ok()
            .filter(|&off| off < data.len())
            .ok_or(ScanError::MalformedHeader)?;

        Ok(Self {
            data,
            desc,
            // Names are bounded by the end of the buffer, not by the string
            // table's recorded size.
            strtab: StringTable::new(&data[strtab_offset..]),
        })
    }

    /// Returns the resolved header descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ElfDescriptor {
        &self.desc
    }

    /// Returns the name of section `index`, if it resolves.
    #[must_use]
    pub fn section_name(&self, index: usize) -> Option<&'a [u8]> {
        let shdr = self.desc.section(self.data, index)?;
        self.strtab.get(shdr.name)
    }

    /// Returns an iterator over the icons in section table order.
    ///
    /// Performs no allocation.
    pub fn icons(&self) -> impl Iterator<Item = IconRecord> + use<'a> {
        self.inspect().filter_map(|(_, verdict)| verdict.ok())
    }

    /// Returns an iterator over every readable section header entry, paired
    /// with either its icon or the reason it was skipped.
    ///
    /// Entries that would lie past the end of the buffer are not yielded:
    /// once one entry is out of bounds, every later one is too.
    #[must_use]
    pub fn inspect(&self) -> Inspect<'a> {
        Inspect {
            scan: *self,
            index: 0,
            count: self.desc.readable_sections(self.data.len()),
        }
    }

    /// Classify section header entry `index`.
    fn classify(&self, index: usize, shdr: &SectionHeader) -> Result<IconRecord, SkipReason> {
        if index == self.desc.shstrndx {
            return Err(SkipReason::StringTable);
        }

        let name = self.strtab.get(shdr.name).ok_or(SkipReason::BadName)?;
        if !is_icon_section_name(name) {
            return Err(SkipReason::NotIcon);
        }

        let len = self.data.len();
        let offset = usize::try_from(shdr.offset)
            .ok()
            .filter(|&off| off < len)
            .ok_or(SkipReason::DataOutOfBounds)?;
        let size = usize::try_from(shdr.size).map_err(|_| SkipReason::DataOutOfBounds)?;
        if size < MIN_PAYLOAD_SIZE {
            return Err(SkipReason::TooSmall);
        }
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= len)
            .ok_or(SkipReason::DataOutOfBounds)?;

        let dims = png::dimensions(&self.data[offset..end]).ok_or(SkipReason::NotPng)?;
        Ok(IconRecord {
            offset,
            size,
            width: dims.width,
            height: dims.height,
        })
    }
}

/// Iterator returned by [`ElfPng::inspect`].
#[derive(Debug, Clone)]
pub struct Inspect<'a> {
    scan: ElfPng<'a>,
    index: usize,
    count: usize,
}

impl Iterator for Inspect<'_> {
    type Item = (usize, Result<IconRecord, SkipReason>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let index = self.index;
        self.index += 1;
        // In bounds: `count` only covers entries that fit in the buffer.
        let shdr = self.scan.desc.section(self.scan.data, index)?;
        Some((index, self.scan.classify(index, &shdr)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

/// Scan `data` for embedded PNG icons.
///
/// Returns the icons in section table order; an empty list means no valid
/// icon section was found.
///
/// # Errors
///
/// See [`ElfPng::parse`].
#[cfg(feature = "alloc")]
pub fn scan(data: &[u8]) -> Result<alloc::vec::Vec<IconRecord>, ScanError> {
    Ok(ElfPng::parse(data)?.icons().collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::header::tests::{BE32, BE64, LE32, LE64, Layout, make_elf_header};
    use crate::header::{ELF64_EHDR_SIZE, ElfClass, SHN_XINDEX};
    use crate::png::tests::make_png;

    /// One section of a test image.
    pub(crate) struct TestSection<'a> {
        pub name: &'a [u8],
        pub data: Vec<u8>,
    }

    pub(crate) fn section(name: &[u8], data: Vec<u8>) -> TestSection<'_> {
        TestSection { name, data }
    }

    /// Write section header entry `index` of a table starting at `shoff`.
    pub(crate) fn write_shdr(
        layout: Layout,
        buf: &mut [u8],
        shoff: usize,
        index: usize,
        shdr: SectionHeader,
    ) {
        let at = shoff + index * layout.class.shdr_size();
        let (offset, size, link) = match layout.class {
            ElfClass::Elf32 => (16, 20, 24),
            ElfClass::Elf64 => (24, 32, 40),
        };
        layout.put_u32(buf, at, shdr.name);
        layout.put_word(buf, at + offset, shdr.offset);
        layout.put_word(buf, at + size, shdr.size);
        layout.put_u32(buf, at + link, shdr.link);
    }

    /// Build an ELF image with a null section, the given sections, and a
    /// trailing `.shstrtab`.
    ///
    /// Layout: file header, section header table, section data, string
    /// table. Returns the image and the offset of the section header table.
    pub(crate) fn make_elf(layout: Layout, sections: &[TestSection<'_>]) -> (Vec<u8>, usize) {
        let mut buf = make_elf_header(layout);
        let shoff = ELF64_EHDR_SIZE;
        let shnum = sections.len() + 2;
        let shstrndx = shnum - 1;
        buf.resize(shoff + shnum * layout.class.shdr_size(), 0);

        let mut strtab = b"\0".to_vec();
        let mut headers = vec![SectionHeader { name: 0, offset: 0, size: 0, link: 0 }];
        for sec in sections {
            headers.push(SectionHeader {
                name: u32::try_from(strtab.len()).unwrap(),
                offset: buf.len() as u64,
                size: sec.data.len() as u64,
                link: 0,
            });
            strtab.extend_from_slice(sec.name);
            strtab.push(0);
            buf.extend_from_slice(&sec.data);
        }
        let shstrtab_name = u32::try_from(strtab.len()).unwrap();
        strtab.extend_from_slice(b".shstrtab\0");
        headers.push(SectionHeader {
            name: shstrtab_name,
            offset: buf.len() as u64,
            size: strtab.len() as u64,
            link: 0,
        });
        buf.extend_from_slice(&strtab);

        for (i, shdr) in headers.into_iter().enumerate() {
            write_shdr(layout, &mut buf, shoff, i, shdr);
        }
        layout.set_shoff(&mut buf, shoff as u64);
        layout.set_shnum(&mut buf, u16::try_from(shnum).unwrap());
        layout.set_shstrndx(&mut buf, u16::try_from(shstrndx).unwrap());

        (buf, shoff)
    }

    /// Read back entry `index` of a test image.
    fn read_shdr(buf: &[u8], index: usize) -> SectionHeader {
        let desc = ElfDescriptor::parse(buf).unwrap();
        desc.section(buf, index).unwrap()
    }

    #[test]
    fn single_icon_le64() {
        let png = make_png(16, 16);
        let (buf, _) = make_elf(LE64, &[section(b".png.16", png.clone())]);

        let icons = scan(&buf).expect("valid ELF");
        assert_eq!(icons.len(), 1);

        let shdr = read_shdr(&buf, 1);
        let icon = icons[0];
        assert_eq!(icon.width, 16);
        assert_eq!(icon.height, 16);
        assert_eq!(icon.offset as u64, shdr.offset);
        assert_eq!(icon.size as u64, shdr.size);
        assert_eq!(icon.data(&buf), Some(&png[..]));
    }

    #[test]
    fn byte_order_and_class_do_not_change_result() {
        let sections = [
            section(b".text", vec![0x90; 32]),
            section(b".png.32", make_png(32, 32)),
            section(b".png.wide", make_png(640, 48)),
        ];
        let (le, _) = make_elf(LE64, &sections);
        let (be, _) = make_elf(BE64, &sections);
        let expected = scan(&le).expect("LE64");
        assert_eq!(expected.len(), 2);
        assert_eq!(scan(&be).expect("BE64"), expected);

        let (le32, _) = make_elf(LE32, &sections);
        let (be32, _) = make_elf(BE32, &sections);
        let dims = |icons: Vec<IconRecord>| -> Vec<(u32, u32)> {
            icons.iter().map(|i| (i.width, i.height)).collect()
        };
        assert_eq!(dims(scan(&le32).expect("LE32")), [(32, 32), (640, 48)]);
        assert_eq!(scan(&le32).expect("LE32"), scan(&be32).expect("BE32"));
    }

    #[test]
    fn section_name_filter() {
        let (buf, _) = make_elf(
            LE64,
            &[
                section(b".png.", make_png(1, 1)),
                section(b".pngx", make_png(2, 2)),
                section(b".png.a", make_png(3, 3)),
                section(b"png.b", make_png(4, 4)),
            ],
        );
        let icons = scan(&buf).expect("valid ELF");
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].width, 3);
    }

    #[test]
    fn records_keep_table_order() {
        let (buf, _) = make_elf(
            BE64,
            &[
                section(b".png.64", make_png(64, 64)),
                section(b".png.16", make_png(16, 16)),
                section(b".png.16", make_png(16, 16)),
                section(b".png.32", make_png(32, 32)),
            ],
        );
        let heights: Vec<u32> = scan(&buf).unwrap().iter().map(|i| i.height).collect();
        assert_eq!(heights, [64, 16, 16, 32]);
    }

    #[test]
    fn scan_is_idempotent() {
        let (buf, _) = make_elf(
            LE32,
            &[section(b".png.1", make_png(8, 9)), section(b".png.2", make_png(10, 11))],
        );
        assert_eq!(scan(&buf), scan(&buf));
    }

    #[test]
    fn out_of_bounds_data_offset_skips_entry() {
        let (mut buf, shoff) = make_elf(
            LE64,
            &[section(b".png.a", make_png(1, 1)), section(b".png.b", make_png(2, 2))],
        );
        let mut shdr = read_shdr(&buf, 1);
        shdr.offset = buf.len() as u64 + 10;
        write_shdr(LE64, &mut buf, shoff, 1, shdr);

        let scan = ElfPng::parse(&buf).unwrap();
        let verdicts: Vec<_> = scan.inspect().collect();
        assert_eq!(verdicts[1], (1, Err(SkipReason::DataOutOfBounds)));
        let icons: Vec<_> = scan.icons().collect();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].width, 2);
    }

    #[test]
    fn data_running_past_end_skips_entry() {
        let (mut buf, shoff) = make_elf(LE64, &[section(b".png.a", make_png(1, 1))]);
        let mut shdr = read_shdr(&buf, 1);
        shdr.size = u64::MAX;
        write_shdr(LE64, &mut buf, shoff, 1, shdr);
        assert_eq!(scan(&buf), Ok(vec![]));

        shdr.size = buf.len() as u64;
        write_shdr(LE64, &mut buf, shoff, 1, shdr);
        assert_eq!(
            ElfPng::parse(&buf).unwrap().inspect().nth(1),
            Some((1, Err(SkipReason::DataOutOfBounds)))
        );
    }

    #[test]
    fn out_of_bounds_name_skips_entry() {
        let (mut buf, shoff) = make_elf(
            BE32,
            &[section(b".png.a", make_png(1, 1)), section(b".png.b", make_png(2, 2))],
        );
        let mut shdr = read_shdr(&buf, 1);
        shdr.name = u32::MAX;
        write_shdr(BE32, &mut buf, shoff, 1, shdr);

        let scan = ElfPng::parse(&buf).unwrap();
        assert_eq!(scan.inspect().nth(1), Some((1, Err(SkipReason::BadName))));
        assert_eq!(scan.icons().map(|i| i.width).collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn unterminated_name_at_end_of_buffer() {
        let (mut buf, _) = make_elf(LE64, &[section(b".png.a", make_png(1, 1))]);
        // The string table is the last thing in the image. Replace its final
        // terminator so `.shstrtab` runs into the end of the buffer.
        let last = buf.len() - 1;
        buf[last] = b'x';
        let scan = ElfPng::parse(&buf).unwrap();
        assert_eq!(scan.section_name(2), None);
        assert_eq!(scan.section_name(1), Some(&b".png.a"[..]));
    }

    #[test]
    fn unterminated_icon_name_is_skipped() {
        let (mut buf, shoff) = make_elf(LE64, &[section(b".png.a", make_png(1, 1))]);
        buf.extend_from_slice(b".png.tail");
        let mut shdr = read_shdr(&buf, 1);
        let strtab_off = usize::try_from(read_shdr(&buf, 2).offset).unwrap();
        shdr.name = u32::try_from(buf.len() - 9 - strtab_off).unwrap();
        write_shdr(LE64, &mut buf, shoff, 1, shdr);

        let scan = ElfPng::parse(&buf).unwrap();
        assert_eq!(scan.inspect().nth(1), Some((1, Err(SkipReason::BadName))));
        assert_eq!(scan.icons().count(), 0);
    }

    #[test]
    fn signature_mismatch_skips_entry() {
        for i in 0..16 {
            let mut png = make_png(16, 16);
            png[i] = png[i].wrapping_add(1);
            let (buf, _) = make_elf(LE64, &[section(b".png.16", png)]);
            let scan = ElfPng::parse(&buf).unwrap();
            assert_eq!(scan.inspect().nth(1), Some((1, Err(SkipReason::NotPng))));
        }
    }

    #[test]
    fn short_payload_skips_entry() {
        let png = make_png(16, 16);
        let (buf, _) = make_elf(LE64, &[section(b".png.16", png[..23].to_vec())]);
        let scan = ElfPng::parse(&buf).unwrap();
        assert_eq!(scan.inspect().nth(1), Some((1, Err(SkipReason::TooSmall))));
    }

    #[test]
    fn string_table_and_null_section_verdicts() {
        let (buf, _) = make_elf(LE64, &[section(b".png.16", make_png(16, 16))]);
        let verdicts: Vec<_> = ElfPng::parse(&buf).unwrap().inspect().collect();
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[0], (0, Err(SkipReason::NotIcon)));
        assert!(verdicts[1].1.is_ok());
        assert_eq!(verdicts[2], (2, Err(SkipReason::StringTable)));
    }

    #[test]
    fn string_table_offset_out_of_bounds_is_fatal() {
        let (mut buf, shoff) = make_elf(LE64, &[section(b".png.16", make_png(16, 16))]);
        let mut shdr = read_shdr(&buf, 2);
        shdr.offset = buf.len() as u64;
        write_shdr(LE64, &mut buf, shoff, 2, shdr);
        assert_eq!(scan(&buf), Err(ScanError::MalformedHeader));
    }

    #[test]
    fn string_table_entry_out_of_bounds_is_fatal() {
        let (buf, _) = make_elf(LE64, &[section(b".png.16", make_png(16, 16))]);
        // Move the table so that only entry 0 still fits in the buffer.
        let mut moved = buf.clone();
        LE64.set_shoff(&mut moved, (buf.len() - 64) as u64);
        assert_eq!(scan(&moved), Err(ScanError::MalformedHeader));
    }

    #[test]
    fn short_buffers_never_panic() {
        let (buf, _) = make_elf(LE64, &[section(b".png.16", make_png(16, 16))]);
        for len in 0..ELF64_EHDR_SIZE {
            assert!(matches!(
                scan(&buf[..len]),
                Err(ScanError::UnsupportedFormat | ScanError::MalformedHeader)
            ));
        }
    }

    #[test]
    fn truncated_buffers_never_panic() {
        let (buf, _) = make_elf(BE32, &[section(b".png.16", make_png(16, 16))]);
        for len in 0..=buf.len() {
            let _ = scan(&buf[..len]);
        }
        assert_eq!(scan(&buf).unwrap().len(), 1);
    }

    #[test]
    fn extended_numbering_end_to_end() {
        let (mut buf, shoff) = make_elf(
            LE64,
            &[section(b".png.16", make_png(16, 16)), section(b".png.32", make_png(32, 32))],
        );
        let mut first = read_shdr(&buf, 0);
        first.size = 4;
        first.link = 3;
        write_shdr(LE64, &mut buf, shoff, 0, first);
        LE64.set_shnum(&mut buf, 0);
        LE64.set_shstrndx(&mut buf, SHN_XINDEX);

        let scan = ElfPng::parse(&buf).unwrap();
        assert_eq!(scan.descriptor().shnum, 4);
        assert_eq!(scan.descriptor().shstrndx, 3);
        assert_eq!(scan.icons().map(|i| i.height).collect::<Vec<_>>(), [16, 32]);
    }

    #[test]
    fn huge_section_count_stops_at_buffer_end() {
        let (mut buf, shoff) = make_elf(LE64, &[section(b".png.16", make_png(16, 16))]);
        let mut first = read_shdr(&buf, 0);
        first.size = u64::MAX >> 8;
        write_shdr(LE64, &mut buf, shoff, 0, first);
        LE64.set_shnum(&mut buf, 0);

        let scan = ElfPng::parse(&buf).unwrap();
        assert!(scan.inspect().count() < buf.len());
        assert_eq!(scan.icons().count(), 1);
    }
}
