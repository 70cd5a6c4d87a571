//! The conversion pipeline: optional gzip inflation, walk, dispatch,
//! sink finalization, progress callbacks.

use async_compression::tokio::bufread::GzipDecoder;
use log::debug;
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::dispatch::{dispatch, Outcome};
use crate::sink::{ArchiveSink, SinkError, ZipSink};
use crate::walk::{ArchiveWalker, Policy, WalkError};

/// The two magic bytes opening a gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fatal pipeline errors, surfaced verbatim to the caller.
///
/// No retry happens at this level; the caller's only recourse is
/// re-supplying a different input.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Gzip magic was detected but inflation failed. Distinct from
    /// tar-level corruption.
    #[error("corrupt compressed input: {0}")]
    Decompression(#[source] std::io::Error),

    /// The walk hit a fatal truncation or corruption condition.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The sink failed while receiving entries or serializing.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Coarse pipeline milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Inflating a gzip-wrapped input.
    Decompressing,
    /// Walking the tar stream and dispatching entries.
    Unpacking,
    /// Serializing the output archive.
    Serializing,
}

/// Advisory progress reports. Purely informational; a caller may drop
/// them without affecting the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// A new pipeline stage started.
    Stage(Stage),
    /// Fractional progress (0-100) while the sink serializes.
    Serializing(u8),
}

/// One-shot tar-to-zip converter.
///
/// Holds only configuration; each [`convert`] call owns its walk state
/// exclusively and shares nothing with other conversions. A conversion
/// either runs to completion or to a fatal error -- no partial output is
/// ever returned.
///
/// [`convert`]: Converter::convert
#[derive(Debug, Clone, Default)]
pub struct Converter {
    /// Walk and dispatch policy.
    pub policy: Policy,
    /// Deflate level handed to the sink; `None` selects the default.
    pub compression_level: Option<i64>,
}

impl Converter {
    /// Create a converter with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a raw or gzip-wrapped tar archive into ZIP bytes.
    ///
    /// # Errors
    ///
    /// See [`ConvertError`].
    pub async fn convert(&self, raw: &[u8]) -> Result<Vec<u8>, ConvertError> {
        self.convert_with_progress(raw, |_| {}).await
    }

    /// [`convert`], reporting advisory [`Progress`] along the way.
    ///
    /// [`convert`]: Converter::convert
    pub async fn convert_with_progress(
        &self,
        raw: &[u8],
        mut progress: impl FnMut(Progress),
    ) -> Result<Vec<u8>, ConvertError> {
        let inflated;
        let data = if raw.starts_with(&GZIP_MAGIC) {
            progress(Progress::Stage(Stage::Decompressing));
            inflated = inflate(raw).await?;
            inflated.as_slice()
        } else {
            raw
        };

        progress(Progress::Stage(Stage::Unpacking));
        let mut sink = ZipSink::new();
        let mut walker = ArchiveWalker::new(data, self.policy.clone());
        while let Some((entry, payload)) = walker.next_entry()? {
            if dispatch(&entry, payload, &mut sink, &self.policy)? == Outcome::Accepted {
                walker.record_accepted();
            }
        }
        debug!(
            "walked {} bytes, accepted {} entries",
            walker.offset(),
            walker.accepted()
        );

        progress(Progress::Stage(Stage::Serializing));
        let bytes = sink.finalize(self.compression_level, &mut |pct| {
            progress(Progress::Serializing(pct));
        })?;
        Ok(bytes)
    }
}

/// Inflate a gzip stream fully into memory.
async fn inflate(raw: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let mut decoder = GzipDecoder::new(raw);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .await
        .map_err(ConvertError::Decompression)?;
    debug!("inflated {} compressed bytes to {}", raw.len(), out.len());
    Ok(out)
}
