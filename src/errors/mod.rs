//! # Error Handling
//!
//! Application-level error type for the RefactorForge backend. Secret
//! failures keep their sanitized [`SecretsError`] form when wrapped here.

use crate::secrets::SecretsError;

/// Custom result type for RefactorForge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the RefactorForge backend
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Secrets subsystem errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Network transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Config(format!("Validation failed: {}", errors))
    }
}
