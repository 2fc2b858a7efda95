mod config;
mod extract;
mod generate;
mod models;
mod openai;
mod prompt;
mod render;
mod routes;
mod session;

use anyhow::Context;
use routes::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::Settings, openai::OpenAiClient, session::SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();
    match settings.key_hint() {
        Some(hint) => tracing::info!("Using API key: {}", hint),
        None => tracing::warn!("⚠️ OPENAI_API_KEY is not set; every submission will be refused"),
    }
    tracing::info!(
        studio_model = %settings.studio_model,
        quick_model = %settings.quick_model,
        max_calls = settings.max_calls,
        "Demo configuration loaded"
    );

    let client = OpenAiClient::new(settings.api_key.clone(), settings.api_base.clone(), settings.request_timeout)
        .context("building HTTP client")?;
    let port = settings.port;
    let state = AppState {
        sessions: SessionStore::default(),
        backend: Arc::new(client),
        settings: Arc::new(settings),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
