//! Health and status handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_loaded: bool,
    feature_version: u8,
    layout_hash: u32,
    inference_count: u64,
    avg_latency_ms: f64,
    tree_count: usize,
    trained_at: Option<DateTime<Utc>>,
    load_error: Option<String>,
    environment: String,
}

/// Plain-text status line
pub async fn root(State(state): State<AppState>) -> String {
    if state.predictor.is_loaded() {
        "Ethical Ad Predictor API is running. Model loaded.".to_string()
    } else {
        "Ethical Ad Predictor API is running. Model NOT loaded: /predict will return an error.".to_string()
    }
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.predictor.status();

    Json(HealthResponse {
        status: if engine.model_loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().timestamp(),
        model_loaded: engine.model_loaded,
        feature_version: engine.feature_version,
        layout_hash: engine.layout_hash,
        inference_count: engine.inference_count,
        avg_latency_ms: engine.avg_latency_ms,
        tree_count: engine.tree_count,
        trained_at: engine.trained_at,
        load_error: engine.load_error,
        environment: state.config.environment.clone(),
    })
}
