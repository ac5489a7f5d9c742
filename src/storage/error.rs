//! Error types for the remote file store

use thiserror::Error;

/// Storage client error
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Blob not found
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed from the given settings
    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
