//! Archive-building sink boundary and the ZIP implementation of it.
//!
//! The core hands decoded entries to an [`ArchiveSink`] and treats the
//! finalized output as opaque bytes; [`ZipSink`] is the provided
//! implementation, backed by the `zip` crate.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// ZIP serialization failed.
    #[error("zip serialization failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error while writing output bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-file options passed alongside a file write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Store the data as a symbolic link target rather than file content.
    pub symlink: bool,
}

/// An archive builder accepting decoded entries.
///
/// The three operations mirror what the converter needs and nothing more;
/// the sink owns every format-specific detail of the output.
pub trait ArchiveSink {
    /// Add a file with the given content.
    fn add_file(&mut self, path: &str, data: &[u8], opts: EntryOptions) -> Result<(), SinkError>;

    /// Add a folder.
    fn add_folder(&mut self, path: &str) -> Result<(), SinkError>;

    /// Serialize the archive and return its bytes.
    ///
    /// `level` selects the compression level (`None` for the default).
    /// `progress` receives fractional progress from 0 to 100 as entries
    /// are written out.
    fn finalize(self, level: Option<i64>, progress: &mut dyn FnMut(u8)) -> Result<Vec<u8>, SinkError>
    where
        Self: Sized;
}

#[derive(Debug)]
enum Pending {
    File {
        path: String,
        data: Vec<u8>,
        symlink: bool,
    },
    Folder {
        path: String,
    },
}

/// [`ArchiveSink`] producing a ZIP archive in memory.
///
/// Entries are queued as they arrive and serialized in one pass during
/// [`finalize`], which is what makes per-entry fractional progress
/// possible. Symlinks are stored as ZIP symlink entries with the target
/// as their textual content.
///
/// [`finalize`]: ArchiveSink::finalize
#[derive(Debug, Default)]
pub struct ZipSink {
    entries: Vec<Pending>,
}

impl ZipSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries queued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveSink for ZipSink {
    fn add_file(&mut self, path: &str, data: &[u8], opts: EntryOptions) -> Result<(), SinkError> {
        self.entries.push(Pending::File {
            path: path.to_owned(),
            data: data.to_vec(),
            symlink: opts.symlink,
        });
        Ok(())
    }

    fn add_folder(&mut self, path: &str) -> Result<(), SinkError> {
        self.entries.push(Pending::Folder {
            path: path.to_owned(),
        });
        Ok(())
    }

    fn finalize(
        self,
        level: Option<i64>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<Vec<u8>, SinkError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let total = self.entries.len();

        for (index, pending) in self.entries.into_iter().enumerate() {
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(level);
            match pending {
                Pending::File {
                    path,
                    data,
                    symlink: false,
                } => {
                    writer.start_file(path, options)?;
                    writer.write_all(&data)?;
                }
                Pending::File {
                    path,
                    data,
                    symlink: true,
                } => {
                    let target = String::from_utf8_lossy(&data).into_owned();
                    writer.add_symlink(path, target, options)?;
                }
                Pending::Folder { path } => {
                    writer.add_directory(path, options)?;
                }
            }
            progress((100 * (index + 1) / total) as u8);
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_roundtrip_file_and_folder() {
        let mut sink = ZipSink::new();
        sink.add_file("hello.txt", b"hi", EntryOptions::default())
            .unwrap();
        sink.add_folder("sub/").unwrap();
        sink.add_file("sub/data.bin", &[0u8; 1000], EntryOptions::default())
            .unwrap();
        assert_eq!(sink.len(), 3);

        let bytes = sink.finalize(None, &mut |_| {}).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut content = String::new();
        archive
            .by_name("hello.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hi");
        assert!(archive.by_name("sub/").is_ok());
    }

    #[test]
    fn test_symlink_stored_as_target_text() {
        let mut sink = ZipSink::new();
        sink.add_file("link", b"target.txt", EntryOptions { symlink: true })
            .unwrap();

        let bytes = sink.finalize(None, &mut |_| {}).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut entry = archive.by_name("link").unwrap();
        let mode = entry.unix_mode().unwrap();
        assert_eq!(mode & 0o170000, 0o120000, "entry should be marked as a symlink");

        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "target.txt");
    }

    #[test]
    fn test_finalize_reports_monotonic_progress() {
        let mut sink = ZipSink::new();
        for i in 0..4 {
            sink.add_file(&format!("f{i}"), b"x", EntryOptions::default())
                .unwrap();
        }

        let mut seen = Vec::new();
        sink.finalize(None, &mut |pct| seen.push(pct)).unwrap();
        assert_eq!(seen, vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_explicit_compression_level() {
        let mut sink = ZipSink::new();
        sink.add_file("a.txt", &b"abc".repeat(100), EntryOptions::default())
            .unwrap();
        let bytes = sink.finalize(Some(9), &mut |_| {}).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = Vec::new();
        archive
            .by_name("a.txt")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"abc".repeat(100));
    }
}
