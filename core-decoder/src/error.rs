//! # Decoder Error Types
//!
//! Error types for decoder construction and control operations.
//!
//! Only operations that can leave the caller without a usable decoder return
//! errors. Mid-stream decode failures degrade to end-of-stream instead (a
//! truncated stream is an acceptable playback outcome, a crashed caller is
//! not), and a rejected seek is reported through `seek`'s `bool` return with
//! the decoder state untouched.

use thiserror::Error;

/// Errors that can occur while opening or cloning a decoder.
#[derive(Error, Debug)]
pub enum DecoderError {
    /// The backend cannot parse the supplied data at all.
    ///
    /// Surfaced at open time; no partial decoder is returned.
    #[error("Unsupported or invalid audio format: {0}")]
    UnsupportedFormat(String),

    /// A required construction step failed after the format itself was
    /// accepted (duration computation, seek-index build/bind, codec
    /// creation). Construction fails atomically; any backend resources
    /// acquired so far are released before the error surfaces.
    #[error("Decoder initialization failed: {0}")]
    InitializationFailed(String),

    /// The process-wide media runtime required by this backend could not be
    /// initialized. Detected once and cached; never retried per call.
    #[error("Media runtime unavailable")]
    RuntimeUnavailable,
}

impl DecoderError {
    /// Returns `true` if this error means the data is not a supported format
    /// (as opposed to a resource or runtime failure).
    pub fn is_format_error(&self) -> bool {
        matches!(self, DecoderError::UnsupportedFormat(_))
    }
}

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, DecoderError>;
