//! Zerocopy-based parsing and validation of raw USTAR header blocks.
//!
//! Every tar header is a fixed 512-byte block. The fields this crate cares
//! about sit at fixed offsets:
//!
//! | Offset | Size | Field    | Description                           |
//! |--------|------|----------|---------------------------------------|
//! | 0      | 100  | name     | File path (null-terminated if < 100)  |
//! | 124    | 12   | size     | File size in octal ASCII              |
//! | 148    | 8    | checksum | Header checksum in octal ASCII        |
//! | 156    | 1    | typeflag | Entry type (see [`EntryType`])        |
//! | 157    | 100  | linkname | Link target for symbolic links        |
//! | 257    | 5    | magic    | "ustar"                               |
//!
//! Validation is deliberately total: [`Header::is_valid`] returns a plain
//! bool over any 512-byte block and never panics, so a corrupted block is
//! an ordinary value rather than an error to unwind through. The walker
//! builds its recovery policy on top of that.

use std::fmt;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of a tar header block in bytes.
pub const HEADER_SIZE: usize = 512;

/// Magic text identifying a USTAR-family header.
///
/// Only the five literal bytes are checked, so both the POSIX `"ustar\0"`
/// and the GNU `"ustar "` variants are accepted.
pub const USTAR_MAGIC: &[u8; 5] = b"ustar";

/// Errors that can occur when decoding header fields.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The provided data is too short to contain a header.
    #[error("insufficient data: expected {HEADER_SIZE} bytes, got {0}")]
    InsufficientData(usize),

    /// An octal numeric field contains non-octal characters.
    #[error("invalid octal field: {0:?}")]
    InvalidOctal(Vec<u8>),
}

/// Result type for header decoding operations.
pub type Result<T> = std::result::Result<T, HeaderError>;

/// Raw 512-byte tar header block.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawHeader {
    /// The raw header bytes.
    pub bytes: [u8; HEADER_SIZE],
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            bytes: [0u8; HEADER_SIZE],
        }
    }
}

impl fmt::Debug for RawHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHeader")
            .field("name", &truncate_null(&self.bytes[0..100]))
            .finish_non_exhaustive()
    }
}

/// Tar entry type, decoded from the typeflag byte at offset 156.
///
/// Only the three types the converter emits get their own variant; every
/// other typeflag is carried through as [`EntryType::Other`] and ignored
/// at dispatch time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file (type '0', or '\0' for pre-POSIX archives).
    Regular,
    /// Symbolic link (type '2').
    Symlink,
    /// Directory (type '5').
    Directory,
    /// Any other typeflag byte.
    Other(u8),
}

impl EntryType {
    /// Parse an entry type from a raw typeflag byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryType::Regular,
            b'2' => EntryType::Symlink,
            b'5' => EntryType::Directory,
            other => EntryType::Other(other),
        }
    }

    /// Returns true if this is a regular file entry.
    #[must_use]
    pub fn is_file(self) -> bool {
        self == EntryType::Regular
    }

    /// Returns true if this is a directory entry.
    #[must_use]
    pub fn is_dir(self) -> bool {
        self == EntryType::Directory
    }

    /// Returns true if this is a symbolic link entry.
    #[must_use]
    pub fn is_symlink(self) -> bool {
        self == EntryType::Symlink
    }
}

impl From<u8> for EntryType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// High-level view of one 512-byte header block with accessor methods.
///
/// This wraps a [`RawHeader`] without copying; [`Header::from_block`]
/// reinterprets a borrowed block in place.
#[derive(Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct Header {
    raw: RawHeader,
}

impl Header {
    /// Parse a header from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InsufficientData`] if fewer than 512 bytes
    /// are available.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::InsufficientData(bytes.len()));
        }
        let raw = RawHeader::ref_from_bytes(&bytes[..HEADER_SIZE])
            .map_err(|_| HeaderError::InsufficientData(bytes.len()))?;
        // SAFETY: Header is #[repr(transparent)] over RawHeader
        Ok(zerocopy::transmute_ref!(raw))
    }

    /// Reinterpret exactly 512 bytes as a header, without copying.
    #[must_use]
    pub fn from_block(bytes: &[u8; HEADER_SIZE]) -> &Header {
        let raw = RawHeader::ref_from_bytes(bytes).expect("size is correct");
        zerocopy::transmute_ref!(raw)
    }

    /// Get a reference to the underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw.bytes
    }

    /// Check if this block is all zero bytes.
    ///
    /// A zero block marks the end of the archive.
    #[must_use]
    pub fn is_zero_block(&self) -> bool {
        self.raw.bytes.iter().all(|&b| b == 0)
    }

    /// Check if the magic field carries the literal "ustar" text.
    #[must_use]
    pub fn has_ustar_magic(&self) -> bool {
        self.raw.bytes[257..262] == *USTAR_MAGIC
    }

    /// Validate this block: USTAR magic present and checksum correct.
    ///
    /// Total over any 512-byte input. An unparseable stored checksum makes
    /// the block invalid rather than raising an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if !self.has_ustar_magic() {
            return false;
        }
        match self.stored_checksum() {
            Ok(stored) => stored == self.compute_checksum(),
            Err(_) => false,
        }
    }

    /// Get the checksum value stored in the header.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field is not valid octal.
    pub fn stored_checksum(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[148..156])
    }

    /// Compute the header checksum.
    ///
    /// The checksum is the unsigned sum of all 512 bytes with the checksum
    /// field itself (bytes 148..156) counted as ASCII spaces.
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        let mut sum: u64 = 0;
        for (i, &byte) in self.raw.bytes.iter().enumerate() {
            if (148..156).contains(&i) {
                sum += u64::from(b' ');
            } else {
                sum += u64::from(byte);
            }
        }
        sum
    }

    /// Get the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.raw.bytes[156])
    }

    /// Get the entry size (payload length) in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the size field is garbage;
    /// callers treat that as an invalid header, not a crash.
    pub fn entry_size(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[124..136])
    }

    /// Get the raw name bytes, truncated at the first null.
    #[must_use]
    pub fn name_bytes(&self) -> &[u8] {
        truncate_null(&self.raw.bytes[0..100])
    }

    /// Get the raw link target bytes, truncated at the first null.
    #[must_use]
    pub fn link_name_bytes(&self) -> &[u8] {
        truncate_null(&self.raw.bytes[157..257])
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("name", &String::from_utf8_lossy(self.name_bytes()))
            .field("entry_type", &self.entry_type())
            .field("size", &self.entry_size().ok())
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Parse an octal ASCII field into a u64.
///
/// Octal fields in tar headers are ASCII strings with optional leading
/// spaces, terminated by a space or null byte. An empty field is 0.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidOctal`] if the field contains anything
/// other than spaces, digits 0-7, or null bytes.
pub fn parse_octal(bytes: &[u8]) -> Result<u64> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let trimmed = &bytes[start..end];

    if trimmed.is_empty() {
        return Ok(0);
    }

    let mut value: u64 = 0;
    for &byte in trimmed {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(HeaderError::InvalidOctal(bytes.to_vec()));
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(|| HeaderError::InvalidOctal(bytes.to_vec()))?;
    }

    Ok(value)
}

/// Truncate a byte slice at the first null byte.
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

/// Decode a fixed-width text field: cut at the first null, then decode as
/// lossy UTF-8 and trim surrounding whitespace.
#[must_use]
pub fn field_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(truncate_null(bytes)).trim().to_owned()
}
