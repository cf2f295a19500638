//! Error types for the WFS cache.

use thiserror::Error;

/// Result type alias using WfsError.
pub type WfsResult<T> = Result<T, WfsError>;

/// Errors that can occur while fetching or caching WFS layers.
#[derive(Error, Debug)]
pub enum WfsError {
    /// Server name not in the server table.
    #[error("unknown WFS server: {0}")]
    UnknownServer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GetCapabilities document could not be read.
    #[error("invalid capabilities document: {0}")]
    Capabilities(String),

    /// The download ran but left no usable file behind.
    #[error("unable to download resource {layer} from {server}: {reason}")]
    DownloadFailed {
        layer: String,
        server: String,
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}
