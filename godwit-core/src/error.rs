//! Error types for godwit-core

use thiserror::Error;

/// Errors surfaced by the migration core.
#[derive(Error, Debug)]
pub enum Error {
    /// A command carries a dispatch key outside the supported set.
    #[error("don't know how to process command '{0}'")]
    UnknownCommand(String),

    /// Malformed migration data (bad up/down shape, empty insert, empty update).
    #[error("{0}")]
    Validation(String),

    /// Subprotocol not present in the backend registry.
    #[error("unsupported backend '{0}'")]
    UnsupportedBackend(String),

    /// Statement execution or introspection failure from the database driver.
    #[error("{0}")]
    Driver(String),

    /// Configuration file problems.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Error
pub type Result<T> = std::result::Result<T, Error>;
