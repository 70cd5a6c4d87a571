//! Configurable recovery and emission policy.

/// Tunable policy knobs for decoding untrusted archives.
///
/// The defaults reproduce the reference behavior; both knobs exist because
/// neither value is a protocol requirement, only a policy choice.
///
/// # Example
///
/// ```
/// use tar2zip::walk::Policy;
///
/// let strict = Policy {
///     invalid_header_threshold: 1,
///     ..Policy::default()
/// };
/// # let _ = strict;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Number of consecutive invalid headers tolerated before the archive
    /// is declared corrupt.
    ///
    /// Recovery always advances by a single 512-byte block per invalid
    /// header; the stride is not configurable since an unvalidated header's
    /// claimed size is exactly the thing that cannot be trusted.
    ///
    /// Default: 3.
    pub invalid_header_threshold: usize,

    /// Whether zero-length regular files are emitted to the sink.
    ///
    /// The reference behavior skips them; set this to emit them as empty
    /// files instead.
    ///
    /// Default: `false`.
    pub emit_empty_files: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            invalid_header_threshold: 3,
            emit_empty_files: false,
        }
    }
}

impl Policy {
    /// Create a new `Policy` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
