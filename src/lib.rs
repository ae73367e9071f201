//! Ethical Ad Performance Predictor
//!
//! Scores ad copy with a gradient-boosted regressor and reports ethical
//! risk (privacy "creepiness" and urgency pressure) keyword counts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    ETHICAL AD PREDICTOR                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────────┐   ┌───────────────────┐  │
//! │  │  API      │──▶│ FeatureBuilder │──▶│ Predictor         │  │
//! │  │  (Axum)   │   │ (layout v1)    │   │ (boosted trees)   │  │
//! │  └───────────┘   └───────▲────────┘   └─────────▲─────────┘  │
//! │                          │                      │            │
//! │                  ┌───────┴────────┐   ┌─────────┴─────────┐  │
//! │                  │ train (CLI)    │──▶│ saved_model/      │  │
//! │                  └────────────────┘   └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use logic::features::{FeatureBuilder, ImageTextPolicy};
use logic::model::Predictor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub features: Arc<FeatureBuilder>,
    pub config: config::Config,
}

impl AppState {
    /// Load the model once and build the matching feature builder
    pub fn load(config: config::Config) -> Self {
        let configured = config
            .image_text_policy
            .as_deref()
            .map(str::parse::<ImageTextPolicy>)
            .transpose();

        let (predictor, policy) = match configured {
            Ok(configured) => Predictor::load(&config.model_dir, configured.as_ref()),
            Err(e) => {
                tracing::warn!("Invalid IMAGE_TEXT_POLICY, serving in degraded mode: {}", e);
                (Predictor::unavailable(e.to_string()), ImageTextPolicy::default())
            }
        };

        Self {
            predictor: Arc::new(predictor),
            features: Arc::new(FeatureBuilder::new(policy)),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/app", get(handlers::app::index))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

/// Install the global tracing subscriber
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
