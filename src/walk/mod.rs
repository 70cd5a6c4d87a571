//! Sequential traversal of a tar buffer with corruption recovery.
//!
//! The [`ArchiveWalker`] drives a fixed state machine over an in-memory
//! archive: scan a 512-byte header, validate it, and either terminate (zero
//! block), skip (invalid header or PAX metadata), or yield a decoded
//! [`TarEntry`] together with its payload slice. A bounded number of
//! consecutive invalid headers is tolerated; recovery always advances by a
//! single block because the claimed size of an unvalidated header cannot be
//! trusted to keep the stream aligned.
//!
//! # Example
//!
//! ```no_run
//! use tar2zip::walk::{ArchiveWalker, Policy};
//!
//! let buf = std::fs::read("archive.tar").unwrap();
//! let mut walker = ArchiveWalker::new(&buf, Policy::default());
//! while let Some((entry, payload)) = walker.next_entry().unwrap() {
//!     println!("{} ({} bytes)", entry.name, payload.len());
//!     walker.record_accepted();
//! }
//! ```

mod entry;
mod error;
mod policy;
mod walker;

pub use entry::{TarEntry, PAX_NAME_MARKER};
pub use error::{Result, WalkError};
pub use policy::Policy;
pub use walker::ArchiveWalker;

#[cfg(test)]
mod tests;
