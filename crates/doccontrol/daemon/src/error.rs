//! Error types for doccontrol-daemon

use doccontrol_types::DocControlError;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing key could not be loaded
    #[error("Signing key error: {0}")]
    SigningKey(String),

    /// Error surfaced by the document control engine
    #[error("Engine error: {0}")]
    Engine(#[from] DocControlError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
