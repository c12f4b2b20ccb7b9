//! Error types for the capvoice pipeline.
//!
//! Only two failures abort a run: the video source cannot be opened, or the
//! output location cannot be written. Everything else is scoped to a single
//! frame, line or caption event and degrades by dropping that unit of work.

use thiserror::Error;

/// Errors produced by the capvoice pipeline.
#[derive(Debug, Error)]
pub enum CapvoiceError {
    /// The video source could not be opened. Fatal to the whole run.
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    /// The text recognition service failed for one frame.
    #[error("text recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    /// The cleanup service failed for one caption.
    #[error("text cleanup unavailable: {0}")]
    CleanupUnavailable(String),

    /// The speech synthesis service failed for one caption.
    #[error("speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// A persisted timeline line did not split into "timestamp: text".
    #[error("malformed timeline line {line}: {content}")]
    MalformedTimelineLine { line: usize, content: String },

    /// Audio decoding or track assembly failed.
    #[error("audio processing error: {0}")]
    AudioProcessing(String),

    /// Video muxing failed.
    #[error("video processing error: {0}")]
    VideoProcessing(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The run was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// HTTP request error.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CapvoiceError {
    fn from(s: &str) -> Self {
        CapvoiceError::Other(s.to_string())
    }
}

impl From<String> for CapvoiceError {
    fn from(s: String) -> Self {
        CapvoiceError::Other(s)
    }
}

/// Result type for the capvoice library.
pub type Result<T> = std::result::Result<T, CapvoiceError>;
