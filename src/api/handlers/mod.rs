pub mod health;

pub use health::{health_handler, secrets_health_handler, HealthResponse, SecretsHealthResponse};
