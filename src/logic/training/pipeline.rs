//! Training Pipeline
//!
//! load CSV → features → seeded split → fit → evaluate → persist

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::logic::features::{FeatureBuilder, ImageTextPolicy};
use crate::logic::model::{
    ArtifactError, GbmParams, GradientBoostedRegressor, ModelArtifact, ModelError,
    ModelMetadata, ModelMetrics,
};
use super::dataset::{self, AdSample, Dataset, DatasetError};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Need at least 2 rows to split, got {0}")]
    TooFewRows(usize),

    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub test_size: f64,
    pub seed: u64,
    pub params: GbmParams,
    pub image_policy: ImageTextPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/mock_ads.csv"),
            output_dir: PathBuf::from("saved_model"),
            test_size: 0.2,
            seed: 42,
            params: GbmParams::default(),
            image_policy: ImageTextPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: Option<ModelMetrics>,
    pub feature_importance: Vec<(String, f64)>,
}

/// Fit a model on in-memory samples
pub fn train(
    samples: &[AdSample],
    config: &TrainingConfig,
    builder: &FeatureBuilder,
) -> Result<(ModelArtifact, TrainingReport), TrainingError> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(TrainingError::InvalidTestSize(config.test_size));
    }
    if samples.len() < 2 {
        return Err(TrainingError::TooFewRows(samples.len()));
    }

    let dataset = Dataset::from_samples(samples, builder);
    let (train, test) = dataset.train_test_split(config.test_size, config.seed);
    if train.is_empty() {
        return Err(TrainingError::TooFewRows(samples.len()));
    }
    info!("Data split: {} train / {} test", train.len(), test.len());

    let model = GradientBoostedRegressor::fit(
        config.params.clone(),
        train.feature_names.clone(),
        &train.features,
        &train.targets,
    )?;

    let predictions = model.predict(&test.features)?;
    let metrics = ModelMetrics::regression(&test.targets, &predictions);
    match &metrics {
        Some(m) => {
            info!("Model Evaluation on Test Set:");
            info!("Mean Absolute Error (MAE): {:.2}", m.mae);
            info!("R-squared (R2): {:.2}", m.r2);
        }
        None => tracing::warn!("No test rows; skipping evaluation"),
    }

    let feature_importance = model.feature_importance();
    for (name, importance) in &feature_importance {
        tracing::debug!("importance {:<18} {:.4}", name, importance);
    }

    let metadata = ModelMetadata {
        train_rows: train.len(),
        test_rows: test.len(),
        metrics,
        trained_at: Utc::now(),
        ..ModelMetadata::current(builder.image_policy().clone(), config.params.clone())
    };

    let report = TrainingReport {
        train_rows: train.len(),
        test_rows: test.len(),
        metrics,
        feature_importance,
    };

    Ok((ModelArtifact::new(model, metadata), report))
}

/// Full offline run: read CSV, train with VADER sentiment, save artifacts
pub fn run(config: &TrainingConfig) -> Result<TrainingReport, TrainingError> {
    info!("Loading training data from {}", config.data_path.display());
    let samples = dataset::load_samples(&config.data_path)?;

    let builder = FeatureBuilder::new(config.image_policy.clone());
    let (artifact, report) = train(&samples, config, &builder)?;
    artifact.save(&config.output_dir)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout;
    use crate::logic::features::sentiment::ConstantScorer;
    use crate::logic::model::artifact::COLUMNS_FILE;
    use crate::logic::model::Predictor;
    use crate::logic::features::AdRecord;

    fn synthetic_samples(n: usize) -> Vec<AdSample> {
        (0..n)
            .map(|i| {
                let cta = i % 2 == 0;
                // Same length either way so only the CTA carries signal
                let text = if cta {
                    format!("Shop now! {:03}", i)
                } else {
                    format!("Read this {:03}", i)
                };
                AdSample {
                    ad_id: i.to_string(),
                    ad_text: text,
                    image_url: None,
                    impressions: if cta { 2000.0 } else { 500.0 },
                    spend: 100.0,
                }
            })
            .collect()
    }

    fn builder() -> FeatureBuilder {
        FeatureBuilder::with_scorer(Box::new(ConstantScorer(0.0)), ImageTextPolicy::AnyUrl)
    }

    fn config(output_dir: PathBuf) -> TrainingConfig {
        TrainingConfig {
            output_dir,
            params: GbmParams { n_estimators: 30, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_train_learns_cta_signal() {
        let samples = synthetic_samples(40);
        let (artifact, report) = train(&samples, &config(PathBuf::new()), &builder()).unwrap();

        assert_eq!(report.test_rows, 8);
        assert_eq!(report.train_rows, 32);
        assert!(report.metrics.unwrap().mae < 5.0);
        assert_eq!(report.feature_importance[0].0, "has_cta");
        assert_eq!(artifact.columns, layout::column_names());
        assert_eq!(artifact.metadata.train_rows, 32);
    }

    #[test]
    fn test_train_rejects_bad_config() {
        let samples = synthetic_samples(1);
        assert!(matches!(
            train(&samples, &config(PathBuf::new()), &builder()),
            Err(TrainingError::TooFewRows(1))
        ));

        let samples = synthetic_samples(10);
        let bad = TrainingConfig { test_size: 1.0, ..config(PathBuf::new()) };
        assert!(matches!(train(&samples, &bad, &builder()), Err(TrainingError::InvalidTestSize(_))));
    }

    /// Training and serving agree on column order end to end
    #[test]
    fn test_trained_artifact_serves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let samples = synthetic_samples(40);
        let (artifact, _) = train(&samples, &config(dir.path().to_path_buf()), &builder()).unwrap();
        artifact.save(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(COLUMNS_FILE)).unwrap();
        let persisted: Vec<String> = serde_json::from_str(&raw).unwrap();

        let serving = builder();
        let features = serving.build(&AdRecord::new("Shop now, new arrivals", None));
        let served_names: Vec<String> = features.vector.feature_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(served_names, persisted);

        let (predictor, _) = Predictor::load(dir.path(), None);
        let with_cta = predictor.predict(&features.vector).unwrap();
        let without_cta = predictor
            .predict(&serving.build(&AdRecord::new("Plain announcement", None)).vector)
            .unwrap();
        assert!(with_cta > without_cta);
    }

    #[test]
    fn test_run_missing_csv() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            data_path: dir.path().join("missing.csv"),
            ..config(dir.path().to_path_buf())
        };
        assert!(matches!(run(&config), Err(TrainingError::Dataset(DatasetError::Csv(_)))));
    }
}
