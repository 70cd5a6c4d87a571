//! Mapping decoded entries onto sink operations.

use crate::header::EntryType;
use crate::sink::{ArchiveSink, EntryOptions, SinkError};
use crate::walk::{Policy, TarEntry};

/// Whether a dispatched entry was actually emitted to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The sink received a call for this entry.
    Accepted,
    /// The entry was silently skipped; never an error.
    Ignored,
}

/// Emit one decoded entry to the sink according to its type.
///
/// - Regular files carry their payload; zero-length files are skipped
///   unless [`Policy::emit_empty_files`] is set.
/// - Symlinks are written as a file whose content is the link target,
///   marked as symbolic via [`EntryOptions`].
/// - Directories become folder-creation calls.
/// - Every other entry type is ignored.
///
/// # Errors
///
/// Propagates any [`SinkError`] from the sink call.
pub fn dispatch<S: ArchiveSink>(
    entry: &TarEntry,
    payload: &[u8],
    sink: &mut S,
    policy: &Policy,
) -> Result<Outcome, SinkError> {
    match entry.entry_type {
        EntryType::Regular => {
            if payload.is_empty() && !policy.emit_empty_files {
                return Ok(Outcome::Ignored);
            }
            sink.add_file(&entry.name, payload, EntryOptions::default())?;
            Ok(Outcome::Accepted)
        }
        EntryType::Symlink => {
            sink.add_file(
                &entry.name,
                entry.link_target.as_bytes(),
                EntryOptions { symlink: true },
            )?;
            Ok(Outcome::Accepted)
        }
        EntryType::Directory => {
            sink.add_folder(&entry.name)?;
            Ok(Outcome::Accepted)
        }
        EntryType::Other(_) => Ok(Outcome::Ignored),
    }
}
