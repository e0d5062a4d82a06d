//! Updater error types.

use crate::config::ConfigError;
use crate::writer::WriterError;

/// Errors that can occur while polling a feed or publishing its changes.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check the feed API key")]
    Unauthorized,

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The updater cannot be set up
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The graph writer refused the update
    #[error("graph writer error: {0}")]
    Writer(#[from] WriterError),
}
