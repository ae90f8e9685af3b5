//! Error types for Veil core operations.
//!
//! Every error is scoped to the single operation that produced it. The CLI
//! layer maps these to exit codes and user-facing hints.

use thiserror::Error;

/// Result type alias for Veil operations.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Core error type for Veil operations.
#[derive(Debug, Error)]
pub enum VeilError {
    /// Secret identifier or file does not exist
    #[error("Secret not found: {0}")]
    SourceNotFound(String),

    /// Enumerating or reading the store failed
    #[error("Store access failed: {0}")]
    StoreAccess(String),

    /// System clipboard could not be read or written
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    /// Undo history or modified flag could not be captured or restored
    #[error("History snapshot failed: {0}")]
    HistorySnapshot(String),

    /// Decryption or encryption of a secret file failed
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for VeilError {
    fn from(err: std::io::Error) -> Self {
        VeilError::StoreAccess(err.to_string())
    }
}

impl From<walkdir::Error> for VeilError {
    fn from(err: walkdir::Error) -> Self {
        VeilError::StoreAccess(err.to_string())
    }
}
