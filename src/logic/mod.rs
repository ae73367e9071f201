//! Logic Module - feature engineering, model and training
//!
//! - `features/` - AdRecord → FeatureVector (shared by training and serving)
//! - `model/` - boosted regressor, artifacts, inference
//! - `training/` - offline pipeline

pub mod features;
pub mod model;
pub mod training;
