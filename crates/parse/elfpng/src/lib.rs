//! Locate PNG icons embedded in ELF executables.
//!
//! Icons are stored verbatim in sections named `.png.<suffix>`. This crate
//! reads 32-bit and 64-bit ELF files of either byte order, walks their
//! section header table and reports every section that holds a PNG stream,
//! together with the image dimensions from its `IHDR` chunk.
//!
//! The input is treated as untrusted: every offset read from the file is
//! bounds-checked before use, and damaged individual sections are skipped
//! rather than failing the whole scan. No unsafe code.
//!
//! # Usage
//!
//! ```
//! fn largest_icon(data: &[u8]) -> Option<&[u8]> {
//!     let icons = elfpng::scan(data).ok()?;
//!     elfpng::icon::tallest(&icons)?.data(data)
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(all(feature = "std", not(test)))]
extern crate std;

#[cfg(feature = "std")]
pub mod file;
pub mod header;
pub mod icon;
pub mod png;
pub mod scan;
pub mod section;

pub use header::{ElfClass, ElfDescriptor, Endian, ScanError};
pub use icon::IconRecord;
#[cfg(feature = "alloc")]
pub use scan::scan;
pub use scan::{ElfPng, Inspect, SkipReason};
pub use section::{SectionHeader, StringTable};
