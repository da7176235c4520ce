//! Error types for the keyscan-core library.
//!
//! Per-target scan failures are values ([`crate::domain::ScanFailure`]), not
//! errors. This type covers everything around them: configuration, tool
//! discovery and parameter handling.

use thiserror::Error;

use crate::domain::StatusError;

/// Result type alias for keyscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside of an individual scan.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The ssh-keyscan binary could not be located.
    #[error("ssh-keyscan not found: {0}")]
    ToolNotFound(String),

    /// A parameter or setting had an unusable value.
    #[error("Invalid value '{value}' for '{name}'")]
    InvalidParameter { name: String, value: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scan status bookkeeping error.
    #[error("Status error: {0}")]
    Status(#[from] StatusError),
}
