//! Model Module - regression model, artifacts and inference

pub mod gbm;
pub mod metrics;
pub mod artifact;
pub mod inference;

// Re-export common types
pub use gbm::{GbmParams, GradientBoostedRegressor, ModelError};
pub use metrics::ModelMetrics;
pub use artifact::{ArtifactError, ModelArtifact, ModelMetadata};
pub use inference::{EngineStatus, InferenceError, Predictor};
