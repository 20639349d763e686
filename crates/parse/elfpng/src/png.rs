//! PNG payload recognition.
//!
//! A section payload is accepted as an icon when it starts with the PNG
//! signature followed by the header of an `IHDR` chunk. Width and height
//! are PNG fields and therefore always big-endian, whatever byte order the
//! enclosing ELF file uses.

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Data length of an `IHDR` chunk.
pub const IHDR_LENGTH: u32 = 13;

/// The 16 bytes every accepted payload starts with: signature, `IHDR` chunk
/// length (big-endian 13) and chunk type.
pub const PNG_IHDR_PREFIX: [u8; 16] = [
    0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', // signature
    0x00, 0x00, 0x00, 0x0d, // IHDR_LENGTH, big-endian
    b'I', b'H', b'D', b'R',
];

/// Smallest payload that holds the prefix plus width and height.
pub const MIN_PAYLOAD_SIZE: usize = 24;

/// Read a big-endian `u32` from `data` at `off`.
///
/// PNG integers only; ELF fields use [`crate::Endian`].
#[must_use]
pub fn be_u32(data: &[u8], off: usize) -> Option<u32> {
    Some(u32::from_be_bytes(*data.get(off..)?.first_chunk()?))
}

/// Image dimensions decoded from an `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Decode the dimensions of a PNG stream.
///
/// Returns `None` if `payload` is shorter than [`MIN_PAYLOAD_SIZE`] or does
/// not start with [`PNG_IHDR_PREFIX`].
#[must_use]
pub fn dimensions(payload: &[u8]) -> Option<Dimensions> {
    if payload.len() < MIN_PAYLOAD_SIZE || payload[..16] != PNG_IHDR_PREFIX {
        return None;
    }
    Some(Dimensions {
        width: be_u32(payload, 16)?,
        height: be_u32(payload, 20)?,
    })
}
