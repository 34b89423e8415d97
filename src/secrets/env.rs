//! Snapshot of the ambient process environment.
//!
//! Provider detection and cloud adapter configuration read from an
//! [`AmbientEnv`] rather than calling `std::env` directly, so both can be
//! exercised with explicit values and never mutate the process environment.

use std::collections::HashMap;

use crate::config::Environment;

use super::error::{Result, SecretsError};

/// Serializes unit tests that mutate the process environment.
#[cfg(test)]
pub(crate) static PROCESS_ENV_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Running-mode variable consulted by the provider detector.
pub const RUNNING_MODE_VAR: &str = "REFACTORFORGE_ENV";

/// Immutable view of environment variables. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct AmbientEnv {
    vars: HashMap<String, String>,
}

impl AmbientEnv {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self { vars: std::env::vars().collect() }
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Value of `key`, or `None` when unset or empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First of `keys` that is set.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Running mode from [`RUNNING_MODE_VAR`]; unset means development.
    pub fn running_mode(&self) -> Result<Environment> {
        match self.get(RUNNING_MODE_VAR) {
            None => Ok(Environment::Development),
            Some(raw) => raw.parse().map_err(|_| {
                SecretsError::config(format!(
                    "{} has an unrecognised value '{}'",
                    RUNNING_MODE_VAR, raw
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_unset() {
        let env = AmbientEnv::from_pairs([("AWS_REGION", ""), ("GCP_PROJECT", "  ")]);
        assert!(!env.is_set("AWS_REGION"));
        assert!(env.get("GCP_PROJECT").is_none());
    }

    #[test]
    fn test_first_of_respects_order() {
        let env = AmbientEnv::from_pairs([("B", "second"), ("C", "third")]);
        assert_eq!(env.first_of(&["A", "B", "C"]), Some("second"));
        assert_eq!(env.first_of(&["A"]), None);
    }

    #[test]
    fn test_running_mode() {
        assert_eq!(AmbientEnv::default().running_mode().unwrap(), Environment::Development);

        let env = AmbientEnv::from_pairs([(RUNNING_MODE_VAR, "production")]);
        assert_eq!(env.running_mode().unwrap(), Environment::Production);

        let env = AmbientEnv::from_pairs([(RUNNING_MODE_VAR, "prodution")]);
        let err = env.running_mode().unwrap_err();
        assert!(matches!(err, SecretsError::Config { .. }));
        assert!(err.to_string().contains(RUNNING_MODE_VAR));
    }
}
