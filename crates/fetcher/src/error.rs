//! Error types for fetch and extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The identifier cannot be mapped to a path beneath the output roots.
    #[error("Invalid identifier {identifier:?}: {reason}")]
    InvalidIdentifier {
        /// Identifier as supplied by the caller
        identifier: String,
        /// Why it was rejected
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("status code {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Transport-level HTTP failure (DNS, TLS, connection reset, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The payload is neither a tar archive nor a compressed stream.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The payload was recognised but could not be decoded.
    #[error("Corrupted archive {path}: {reason}")]
    Corrupted {
        /// Path of the downloaded file
        path: PathBuf,
        /// Decoder error message
        reason: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled by the user.
    #[error("Cancelled by user")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn corrupted(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        FetchError::Corrupted {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}
