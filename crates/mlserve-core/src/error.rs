//! Error types for mlserve Core.

use crate::lifecycle::LifecycleError;
use crate::storage::StorageError;
use thiserror::Error;

/// Top-level error type for the server.
#[derive(Error, Debug)]
pub enum MlServeError {
    /// Server-related errors
    #[error("Server error: {0}")]
    Server(#[from] tonic::transport::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Address parsing errors
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Lifecycle errors
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Result type alias for mlserve operations.
pub type Result<T> = std::result::Result<T, MlServeError>;
