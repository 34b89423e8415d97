//! # REST API Components
//!
//! HTTP surface of the RefactorForge backend: liveness and secrets
//! readiness endpoints behind request tracing.

pub mod handlers;
pub mod routes;
pub mod server;

pub use routes::{build_router, ApiState};
pub use server::{serve, start_api_server};
