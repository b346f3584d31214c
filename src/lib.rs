pub mod api; // HTTP API router and server
pub mod appointment; // Appointment lifecycle
pub mod backend; // Document store, user directory, messaging
pub mod config;
pub mod dashboard; // Admin status counts
pub mod datetime;
pub mod error;
pub mod forms; // Schema registry, form state, field renderer
pub mod models;
pub mod notification; // Appointment SMS
pub mod patient; // Signup and registration
pub mod revalidate;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::backend::{AppwriteClient, BackendError, MemoryBackend};
use crate::config::{AppConfig, BackendKind};

/// Wire the services to the configured backend.
pub fn build_context(config: &AppConfig) -> Result<ApiContext, BackendError> {
    match config.backend {
        BackendKind::Appwrite => {
            let client = Arc::new(AppwriteClient::new(
                &config.appwrite,
                config.http_timeout_secs,
            )?);
            Ok(ApiContext::new(
                client.clone(),
                client.clone(),
                client,
                &config.collections,
                BackendKind::Appwrite,
            ))
        }
        BackendKind::Memory => {
            tracing::warn!("No hosted backend configured, data is kept in memory only");
            Ok(ApiContext::in_memory(
                Arc::new(MemoryBackend::new()),
                &config.collections,
            ))
        }
    }
}

/// Start the API server and run until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<(), String> {
    let ctx = build_context(&config).map_err(|e| format!("Backend setup failed: {e}"))?;
    let mut server = api::start_server(ctx, config.bind).await?;

    tracing::info!(addr = %server.session.server_addr, "{} ready", config::APP_NAME);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve(config)) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
