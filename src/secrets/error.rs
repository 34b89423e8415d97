//! Error types for secrets management operations.
//!
//! Two layers exist. [`ProviderFetchError`] is what adapters report and may
//! carry provider-internal detail (endpoints, status bodies, SDK messages).
//! [`SecretsError`] is the only shape application code ever observes; the
//! [`SecretsManager`](super::SecretsManager) converts the former into the
//! latter and drops the detail on the way.

use std::fmt;

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Caller-visible secrets errors.
///
/// None of the variants carry a secret value or an underlying cause, so
/// `Display`, `Debug` and `source()` are all safe to log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretsError {
    /// No provider could be determined while running in production.
    #[error("Could not detect cloud environment")]
    EnvironmentDetection,

    /// A secret could not be fetched. The message is fixed on purpose.
    #[error("Secret retrieval failed")]
    SecretRetrieval { name: String },

    /// Startup validation found required secrets that cannot be resolved.
    #[error("Missing required secrets: {}", names.join(", "))]
    MissingSecrets { names: Vec<String> },

    /// Secrets configuration is invalid or a provider cannot be constructed.
    #[error("Secrets configuration error: {message}")]
    Config { message: String },
}

impl SecretsError {
    /// Create a sanitized retrieval error for `name`.
    pub fn retrieval(name: impl Into<String>) -> Self {
        Self::SecretRetrieval { name: name.into() }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Logical name of the secret a retrieval error refers to.
    pub fn secret_name(&self) -> Option<&str> {
        match self {
            Self::SecretRetrieval { name } => Some(name),
            _ => None,
        }
    }

    /// Names reported missing by startup validation.
    pub fn missing_names(&self) -> &[String] {
        match self {
            Self::MissingSecrets { names } => names,
            _ => &[],
        }
    }
}

/// Failure category of a [`ProviderFetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound,
    AccessDenied,
    Unavailable,
    Timeout,
    InvalidPayload,
}

impl FetchFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::InvalidPayload => "invalid_payload",
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level failure.
///
/// `detail` may contain anything the provider said, including paths,
/// connection strings or credentials. It must never leave the manager.
#[derive(Error, Debug)]
#[error("{failure}: {detail}")]
pub struct ProviderFetchError {
    failure: FetchFailure,
    detail: String,
}

impl ProviderFetchError {
    pub fn new(failure: FetchFailure, detail: impl Into<String>) -> Self {
        Self { failure, detail: detail.into() }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(FetchFailure::NotFound, detail)
    }

    pub fn access_denied(detail: impl Into<String>) -> Self {
        Self::new(FetchFailure::AccessDenied, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(FetchFailure::Unavailable, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FetchFailure::Timeout, detail)
    }

    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self::new(FetchFailure::InvalidPayload, detail)
    }

    pub fn failure(&self) -> FetchFailure {
        self.failure
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_message_is_fixed() {
        let err = SecretsError::retrieval("GITHUB_TOKEN");
        assert_eq!(err.to_string(), "Secret retrieval failed");
        assert_eq!(err.secret_name(), Some("GITHUB_TOKEN"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_missing_secrets_lists_names() {
        let err = SecretsError::MissingSecrets {
            names: vec!["JWT_SECRET".to_string(), "SESSION_SECRET".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required secrets: JWT_SECRET, SESSION_SECRET");
        assert_eq!(err.missing_names().len(), 2);
    }

    #[test]
    fn test_environment_detection_message() {
        assert_eq!(
            SecretsError::EnvironmentDetection.to_string(),
            "Could not detect cloud environment"
        );
    }

    #[test]
    fn test_provider_fetch_error_keeps_category() {
        let err = ProviderFetchError::access_denied("403 from vault https://kv.example");
        assert_eq!(err.failure(), FetchFailure::AccessDenied);
        assert!(err.to_string().starts_with("access_denied"));
        assert!(err.detail().contains("403"));
    }
}
