//! Ethical Ad Predictor API server

use std::net::SocketAddr;

use anyhow::Context;

use ethical_ads::{config, create_router, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    init_tracing("ethical_ads=debug,tower_http=debug");
    let config = config::Config::from_env();

    tracing::info!("Ethical Ad Predictor starting ({})...", config.environment);
    tracing::info!("Model directory: {}", config.model_dir.display());

    let state = AppState::load(config.clone());
    if !state.predictor.is_loaded() {
        tracing::warn!("No model loaded; run `cargo run --bin train` to create one");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
