//! API server entrypoint.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use reel_api::{create_router, ApiConfig, AppState};
use reel_providers::{LlmClient, MediaServiceClient, PexelsClient};
use reel_worker::{Collaborators, Pipeline, TaskStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::from_env();

    let llm = Arc::new(LlmClient::from_env()?);
    let footage = Arc::new(PexelsClient::from_env()?);
    let media = Arc::new(MediaServiceClient::from_env()?);
    let collaborators = Arc::new(Collaborators {
        llm,
        tts: media.clone(),
        captions: media.clone(),
        footage,
        renderer: media,
    });
    let pipeline = Pipeline::new(TaskStore::new(), collaborators);

    let metrics_handle = if config.metrics_enabled {
        Some(reel_api::metrics::install_recorder()?)
    } else {
        None
    };

    let addr = config.bind_addr();
    let state = AppState::new(config, pipeline);
    let router = create_router(state, metrics_handle);

    info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
