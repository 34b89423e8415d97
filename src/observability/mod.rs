//! # Observability Infrastructure
//!
//! Structured logging for the RefactorForge backend. HTTP request tracing
//! is attached to the router in [`crate::api`].

pub mod logging;

pub use logging::{init_logging, log_config_info};
