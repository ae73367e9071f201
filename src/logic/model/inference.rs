//! Inference Engine - runs the loaded regressor
//!
//! The predictor is built once at startup and shared read-only across
//! requests. A failed artifact load leaves it in a degraded state that
//! reports `ModelUnavailable` instead of taking the process down.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::{FeatureVector, ImageTextPolicy, LayoutMismatchError};
use crate::logic::features::layout::{self, FEATURE_VERSION};
use super::artifact::ModelArtifact;
use super::gbm::ModelError;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Engine status for the status endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub load_error: Option<String>,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub tree_count: usize,
    pub trained_at: Option<DateTime<Utc>>,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not loaded: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

enum ModelState {
    Ready(ModelArtifact),
    Unavailable(String),
}

// ============================================================================
// PREDICTOR
// ============================================================================

pub struct Predictor {
    state: ModelState,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl Predictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self::with_state(ModelState::Ready(artifact))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_state(ModelState::Unavailable(reason.into()))
    }

    fn with_state(state: ModelState) -> Self {
        Self {
            state,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    /// Load and validate the artifact in `dir`, resolving the image text
    /// policy. Never fails: errors produce a degraded predictor and the
    /// configured (or default) policy.
    pub fn load(dir: &Path, configured: Option<&ImageTextPolicy>) -> (Self, ImageTextPolicy) {
        let fallback_policy = configured.cloned().unwrap_or_default();

        let artifact = match ModelArtifact::load(dir) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!("Model unavailable, serving in degraded mode: {}", e);
                return (Self::unavailable(e.to_string()), fallback_policy);
            }
        };

        match artifact.resolve_policy(configured) {
            Ok(policy) => {
                tracing::info!("Image text policy: {}", policy);
                (Self::from_artifact(artifact), policy)
            }
            Err(e) => {
                tracing::warn!("Model rejected, serving in degraded mode: {}", e);
                (Self::unavailable(e.to_string()), fallback_policy)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Predict the performance score, rounded to 2 decimals
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64, InferenceError> {
        let artifact = match &self.state {
            ModelState::Ready(artifact) => artifact,
            ModelState::Unavailable(reason) => {
                return Err(InferenceError::ModelUnavailable(reason.clone()));
            }
        };

        let start_time = Instant::now();

        vector.validate()?;
        layout::validate_layout(artifact.metadata.feature_version, artifact.metadata.layout_hash)?;

        let raw = artifact.model.predict_row(vector.as_slice())?;

        self.latency_sum_us
            .fetch_add(start_time.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(raw, "prediction");
        Ok(round2(raw))
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        let (load_error, tree_count, trained_at) = match &self.state {
            ModelState::Ready(artifact) => (
                None,
                artifact.model.tree_count(),
                Some(artifact.metadata.trained_at),
            ),
            ModelState::Unavailable(reason) => (Some(reason.clone()), 0, None),
        };

        EngineStatus {
            model_loaded: self.is_loaded(),
            load_error,
            feature_version: FEATURE_VERSION,
            layout_hash: layout::layout_hash(),
            tree_count,
            trained_at,
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}

/// Round to 2 decimal places.
///
/// Uses `f64::round`, so ties round away from zero (0.125 → 0.13). Half-to-even
/// is not used; for exact binary halves this can differ by 0.01 from scores
/// rounded with banker's rounding.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
