//! Training Module - offline model fitting
//!
//! Builds features with the serving-time `FeatureBuilder`, so the persisted
//! column order is the one the server validates against.

pub mod dataset;
pub mod pipeline;

pub use dataset::{AdSample, Dataset, DatasetError};
pub use pipeline::{run, train, TrainingConfig, TrainingError, TrainingReport};
