//! The archive walk state machine.

use std::ops::Range;

use log::debug;

use crate::header::{Header, HEADER_SIZE};

use super::entry::TarEntry;
use super::error::{Result, WalkError};
use super::policy::Policy;

const BLOCK: u64 = HEADER_SIZE as u64;

/// Outcome of one state-machine step at `ScanHeader`.
enum Step {
    /// Zero block: archive traversal terminates.
    End,
    /// Invalid header or PAX metadata: state advanced, nothing to yield.
    Skip,
    /// A decoded entry and the buffer range of its payload.
    Entry(TarEntry, Range<usize>),
}

/// Sequential walker over an in-memory tar archive.
///
/// Produces a lazy, finite, non-restartable sequence of
/// `(TarEntry, payload)` pairs in archive order. The walk state (cursor,
/// recovery counter, accepted-entry count) is owned exclusively by the
/// walker and discarded with it; nothing persists across conversions.
///
/// # Recovery
///
/// A header that fails validation (bad magic, checksum mismatch, or octal
/// garbage in the size field) is skipped by advancing exactly one 512-byte
/// block. Skipping the *claimed* payload of a bad header would let a single
/// corrupted size field throw the whole stream out of alignment. Once
/// [`Policy::invalid_header_threshold`] consecutive blocks fail, the
/// archive is declared corrupt.
///
/// # Accepted entries
///
/// The walker cannot tell whether a yielded entry was actually emitted by
/// the sink (zero-length files and unrecognized types are not). The driver
/// calls [`record_accepted`] per emitted entry; an archive that terminates
/// with zero accepted entries is rejected as [`WalkError::Empty`].
///
/// [`record_accepted`]: ArchiveWalker::record_accepted
#[derive(Debug)]
pub struct ArchiveWalker<'a> {
    buf: &'a [u8],
    policy: Policy,
    /// Byte cursor, a multiple of 512 whenever a header is scanned.
    offset: u64,
    /// Back-to-back invalid headers, reset on every valid one.
    consecutive_invalid: usize,
    /// Entries the driver reported as emitted to the sink.
    accepted: usize,
    done: bool,
}

impl<'a> ArchiveWalker<'a> {
    /// Create a walker over `buf` with the given policy.
    pub fn new(buf: &'a [u8], policy: Policy) -> Self {
        Self {
            buf,
            policy,
            offset: 0,
            consecutive_invalid: 0,
            accepted: 0,
            done: false,
        }
    }

    /// Create a walker with the default policy.
    pub fn with_defaults(buf: &'a [u8]) -> Self {
        Self::new(buf, Policy::default())
    }

    /// Current byte offset into the archive buffer.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of entries recorded as accepted so far.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Record that the most recently yielded entry was emitted to the sink.
    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    /// Get the walker's policy.
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Get the next entry and its payload slice.
    ///
    /// Returns `Ok(None)` once the end-of-archive zero block is reached.
    ///
    /// # Errors
    ///
    /// - [`WalkError::TruncatedHeader`] if fewer than 512 bytes remain
    ///   before a zero block was seen.
    /// - [`WalkError::TruncatedPayload`] if an entry's payload extends past
    ///   the end of the buffer.
    /// - [`WalkError::TooManyInvalidHeaders`] once the recovery threshold
    ///   is reached.
    /// - [`WalkError::Empty`] if the archive ends with nothing accepted.
    pub fn next_entry(&mut self) -> Result<Option<(TarEntry, &'a [u8])>> {
        if self.done {
            return Ok(None);
        }

        loop {
            let step = match self.step() {
                Ok(step) => step,
                Err(err) => {
                    self.done = true;
                    return Err(err);
                }
            };
            match step {
                Step::End => {
                    self.done = true;
                    if self.accepted == 0 {
                        return Err(WalkError::Empty);
                    }
                    return Ok(None);
                }
                Step::Skip => continue,
                Step::Entry(entry, payload) => {
                    return Ok(Some((entry, &self.buf[payload])));
                }
            }
        }
    }

    /// Run one `ScanHeader` transition.
    fn step(&mut self) -> Result<Step> {
        let len = self.buf.len() as u64;
        let remaining = len.saturating_sub(self.offset);
        if remaining < BLOCK {
            return Err(WalkError::TruncatedHeader {
                offset: self.offset,
                remaining,
            });
        }

        let start = self.offset as usize;
        let header = match Header::from_bytes(&self.buf[start..start + HEADER_SIZE]) {
            Ok(header) => header,
            Err(_) => {
                return Err(WalkError::TruncatedHeader {
                    offset: self.offset,
                    remaining,
                })
            }
        };

        if header.is_zero_block() {
            return Ok(Step::End);
        }

        let decoded = if header.is_valid() {
            TarEntry::decode(header).ok()
        } else {
            None
        };

        let Some(entry) = decoded else {
            self.consecutive_invalid += 1;
            if self.consecutive_invalid >= self.policy.invalid_header_threshold {
                return Err(WalkError::TooManyInvalidHeaders {
                    count: self.consecutive_invalid,
                    offset: self.offset,
                });
            }
            debug!("skipping invalid header block at offset {}", self.offset);
            // One block only: the claimed size of an unvalidated header is
            // untrusted and must not steer the cursor.
            self.offset += BLOCK;
            return Ok(Step::Skip);
        };

        self.consecutive_invalid = 0;
        let advance = BLOCK + entry.padded_size();

        if entry.is_pax_header() {
            debug!(
                "skipping PAX metadata entry {:?} ({} payload bytes)",
                entry.name, entry.size
            );
            self.offset += advance;
            return Ok(Step::Skip);
        }

        let payload_start = self.offset + BLOCK;
        let payload_end = payload_start + entry.size;
        if payload_end > len {
            return Err(WalkError::TruncatedPayload {
                name: entry.name,
                offset: self.offset,
                size: entry.size,
            });
        }

        self.offset += advance;
        Ok(Step::Entry(
            entry,
            payload_start as usize..payload_end as usize,
        ))
    }
}
