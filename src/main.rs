use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use somnia_backend::auth::HttpIdentityVerifier;
use somnia_backend::config::Config;
use somnia_backend::llm::client::build_ai_client;
use somnia_backend::logging::init_subscriber;
use somnia_backend::routes::app_router;
use somnia_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    tracing::info!("Starting Somnia backend server...");

    let config = Arc::new(Config::load().context("Failed to load configuration")?);

    // Collaborators are built once here and injected; no module globals.
    let identity_base_url = config
        .identity_base_url
        .clone()
        .context("IDENTITY_BASE_URL must be set")?;
    let identity_service_key = config
        .identity_service_key
        .clone()
        .context("IDENTITY_SERVICE_KEY must be set")?;
    let identity_verifier = Arc::new(
        HttpIdentityVerifier::new(
            identity_base_url,
            identity_service_key,
            Duration::from_secs(config.identity_timeout_secs),
        )
        .context("Failed to build identity verifier")?,
    );

    let ai_client = build_ai_client();

    let state = AppState::new(config.clone(), ai_client, identity_verifier);
    let app = app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
