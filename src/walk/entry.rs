//! Decoded tar entry descriptor.

use crate::header::{field_text, EntryType, Header, HeaderError};

/// Name substring marking a PAX extended-attribute entry.
///
/// PAX producers name their metadata entries along the lines of
/// `./PaxHeaders.0/real-name`; the marker is matched as a substring so both
/// the GNU and the BSD spellings are caught.
pub const PAX_NAME_MARKER: &str = "PaxHeader";

/// One decoded archive entry.
///
/// Built from a validated header block and consumed within a single walk
/// iteration; nothing here outlives the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Entry path, decoded from the 100-byte name field and trimmed of
    /// padding and null bytes.
    pub name: String,

    /// The entry type.
    pub entry_type: EntryType,

    /// Payload length in bytes. 0 for directories and symlinks.
    pub size: u64,

    /// Symlink target, decoded from the 100-byte linkname field.
    /// Empty for every other entry type.
    pub link_target: String,
}

impl TarEntry {
    /// Decode an entry descriptor from a header block.
    ///
    /// The caller is expected to have validated the block first; decoding
    /// an unvalidated pre-checksum header is best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the size field contains
    /// non-octal garbage. Callers treat this as an invalid header.
    pub fn decode(header: &Header) -> Result<Self, HeaderError> {
        let entry_type = header.entry_type();
        let link_target = if entry_type == EntryType::Symlink {
            field_text(header.link_name_bytes())
        } else {
            String::new()
        };
        Ok(Self {
            name: field_text(header.name_bytes()),
            entry_type,
            size: header.entry_size()?,
            link_target,
        })
    }

    /// Whether this entry is PAX metadata, recognized by name.
    ///
    /// PAX entries carry no emitted content but still occupy their declared
    /// (padded) space in the byte stream.
    #[must_use]
    pub fn is_pax_header(&self) -> bool {
        self.name.contains(PAX_NAME_MARKER)
    }

    /// Payload length rounded up to the next 512-byte boundary.
    ///
    /// This is the number of payload bytes the stream actually occupies;
    /// a size of 0 occupies 0.
    #[must_use]
    pub fn padded_size(&self) -> u64 {
        self.size.next_multiple_of(512)
    }
}
