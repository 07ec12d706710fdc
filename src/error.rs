//! Error types for signal decoding

use std::path::PathBuf;

/// Every failure a decode session can surface.
///
/// Metadata and structural violations are fail-fast: nothing is defaulted or
/// coerced. Truncation of a trailing partial frame or epoch is not an error
/// unless `TruncationPolicy::Strict` is selected.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Invalid header or source metadata (zero sample width, zero frequency,
    /// zero frame width, unknown byte order...)
    #[error("Invalid metadata: {0}")]
    Metadata(String),

    #[error("Failed to read signal file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The raw data cannot be laid out as the metadata describes
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Malformed header document: {0}")]
    HeaderDocument(#[from] serde_json::Error),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl SignalError {
    pub(crate) fn metadata(msg: impl Into<String>) -> Self {
        SignalError::Metadata(msg.into())
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        SignalError::Structural(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignalError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SignalResult<T> = Result<T, SignalError>;
