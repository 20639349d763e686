//! Icon records and icon selection.

/// An embedded PNG icon found by a scan.
///
/// `offset` and `size` locate the PNG stream in the scanned buffer; the
/// range is guaranteed to lie inside it. `width` and `height` come from the
/// stream's `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconRecord {
    /// Byte offset of the PNG stream.
    pub offset: usize,
    /// Length of the PNG stream in bytes.
    pub size: usize,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl IconRecord {
    /// Returns the PNG stream within `data`, the buffer that was scanned.
    ///
    /// Returns `None` if the range does not fit, which only happens when a
    /// different buffer is passed.
    #[must_use]
    pub fn data<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        data.get(self.offset..self.offset.checked_add(self.size)?)
    }
}

/// Returns the tallest icon, the first one on ties.
#[must_use]
pub fn tallest(icons: &[IconRecord]) -> Option<&IconRecord> {
    icons
        .iter()
        .reduce(|best, icon| if icon.height > best.height { icon } else { best })
}

/// Returns the first icon whose height is exactly `height`, falling back to
/// [`tallest`].
#[must_use]
pub fn select_for_height(icons: &[IconRecord], height: u32) -> Option<&IconRecord> {
    icons
        .iter()
        .find(|icon| icon.height == height)
        .or_else(|| tallest(icons))
}
