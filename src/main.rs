use anyhow::Context;
use refactorforge::{
    api::{start_api_server, ApiState},
    config::AppConfig,
    observability::{init_logging, log_config_info},
    startup::initialize_secrets,
    APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env().context("loading configuration")?;
    init_logging(&config.observability).context("initializing logging")?;

    info!(app_name = APP_NAME, version = VERSION, "Starting RefactorForge backend");
    log_config_info(&config);

    let secrets = match initialize_secrets(&config).await {
        Ok(secrets) => secrets,
        Err(e) => {
            error!(error = %e, "Secrets initialization failed");
            return Err(e).context("initializing secrets");
        }
    };

    let state = ApiState::new(secrets, config.observability.service_name.clone());
    start_api_server(&config.server, state).await.context("running API server")?;

    info!("RefactorForge backend stopped");
    Ok(())
}
