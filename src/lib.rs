//! Fault-tolerant conversion of USTAR tape archives to ZIP.
//!
//! The crate decodes a tar archive held in memory -- raw or gzip-wrapped --
//! and re-emits its entries into an archive-building sink, with an
//! in-memory ZIP writer as the provided sink. Decoding tolerates a bounded
//! run of corrupted header blocks by skipping one block at a time, so a
//! single damaged field does not throw away an otherwise readable archive.
//!
//! # Layers
//!
//! - [`header`] -- parsing and validation of one fixed 512-byte block
//! - [`walk`] -- sequential traversal with the recovery state machine
//! - [`dispatch`] -- entry-type dispatch onto the sink
//! - [`sink`] -- the [`ArchiveSink`] boundary and [`ZipSink`]
//! - [`convert`] -- the async pipeline tying it all together
//!
//! # Example
//!
//! ```no_run
//! use tar2zip::Converter;
//!
//! # async fn demo() -> Result<(), tar2zip::ConvertError> {
//! let raw = std::fs::read("archive.tar.gz").unwrap();
//! let zip_bytes = Converter::new().convert(&raw).await?;
//! std::fs::write("archive.zip", zip_bytes).unwrap();
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod dispatch;
pub mod header;
pub mod sink;
pub mod walk;

pub use convert::{ConvertError, Converter, Progress, Stage, GZIP_MAGIC};
pub use dispatch::{dispatch, Outcome};
pub use header::{EntryType, Header, HeaderError, HEADER_SIZE};
pub use sink::{ArchiveSink, EntryOptions, SinkError, ZipSink};
pub use walk::{ArchiveWalker, Policy, TarEntry, WalkError};
