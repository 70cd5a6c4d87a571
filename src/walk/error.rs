//! Fatal error conditions raised during the walk.
//!
//! A single invalid header below the policy threshold is a recoverable
//! event handled inside the walker and never shows up here.

use thiserror::Error;

/// Fatal conditions that terminate a walk.
///
/// Two classes: truncation (the buffer ends mid-header or mid-payload) and
/// corruption (too many consecutive invalid headers, or an archive that
/// yielded nothing). Display strings are surfaced verbatim to the caller.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The buffer ends before a full header block.
    #[error("truncated archive: {remaining} bytes remain at offset {offset}, need a full 512-byte header")]
    TruncatedHeader {
        /// Offset at which the header scan started.
        offset: u64,
        /// Bytes remaining in the buffer.
        remaining: u64,
    },

    /// An entry's declared payload extends past the end of the buffer.
    #[error("truncated archive: entry {name:?} claims {size} bytes at offset {offset}, past the end of the buffer")]
    TruncatedPayload {
        /// Name of the offending entry.
        name: String,
        /// Offset of the entry's header block.
        offset: u64,
        /// Declared payload size.
        size: u64,
    },

    /// The consecutive-invalid-header threshold was reached.
    #[error("corrupt archive: {count} consecutive invalid headers at offset {offset}")]
    TooManyInvalidHeaders {
        /// Number of back-to-back invalid headers seen.
        count: usize,
        /// Offset of the last invalid block.
        offset: u64,
    },

    /// The archive terminated without a single accepted entry.
    #[error("corrupt archive: no entries")]
    Empty,
}

/// Result type for walk operations.
pub type Result<T> = std::result::Result<T, WalkError>;
