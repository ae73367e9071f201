//! Model Artifact - persisted regressor + column contract
//!
//! Two files live in the model directory:
//! - `model.json`: the fitted ensemble plus training metadata
//! - `model_columns.json`: JSON array of the training-time column order
//!
//! Loading validates both against the compiled feature layout and against
//! each other. Any mismatch fails the load.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::layout::{self, LayoutMismatchError, FEATURE_VERSION};
use crate::logic::features::ImageTextPolicy;
use super::gbm::{GbmParams, GradientBoostedRegressor, ModelError};
use super::metrics::ModelMetrics;

pub const MODEL_FILE: &str = "model.json";
pub const COLUMNS_FILE: &str = "model_columns.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt artifact {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("Model features {model:?} do not match column file {columns:?}")]
    ModelColumns {
        model: Vec<String>,
        columns: Vec<String>,
    },

    #[error("Corrupt model structure: {0}")]
    CorruptTree(#[source] ModelError),

    #[error("Image text policy mismatch: model trained with '{trained}', configured '{configured}'")]
    PolicyMismatch {
        trained: ImageTextPolicy,
        configured: ImageTextPolicy,
    },
}

/// Training-time facts persisted next to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_version: u8,
    pub layout_hash: u32,
    pub image_text_policy: ImageTextPolicy,
    pub params: GbmParams,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: Option<ModelMetrics>,
    pub trained_at: DateTime<Utc>,
}

impl ModelMetadata {
    /// Metadata stamped with the current layout
    pub fn current(image_text_policy: ImageTextPolicy, params: GbmParams) -> Self {
        Self {
            feature_version: FEATURE_VERSION,
            layout_hash: layout::layout_hash(),
            image_text_policy,
            params,
            train_rows: 0,
            test_rows: 0,
            metrics: None,
            trained_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    metadata: ModelMetadata,
    model: GradientBoostedRegressor,
}

/// Fitted model, its metadata and the expected column order
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub model: GradientBoostedRegressor,
    pub metadata: ModelMetadata,
    pub columns: Vec<String>,
}

impl ModelArtifact {
    pub fn new(model: GradientBoostedRegressor, metadata: ModelMetadata) -> Self {
        let columns = model.feature_names().to_vec();
        Self { model, metadata, columns }
    }

    /// Check the artifact against the compiled feature layout and check the
    /// tree structure
    pub fn validate(&self) -> Result<(), ArtifactError> {
        layout::validate_columns(&self.columns)?;

        if self.model.feature_names() != self.columns.as_slice() {
            return Err(ArtifactError::ModelColumns {
                model: self.model.feature_names().to_vec(),
                columns: self.columns.clone(),
            });
        }

        layout::validate_layout(self.metadata.feature_version, self.metadata.layout_hash)?;
        self.model.validate().map_err(ArtifactError::CorruptTree)?;
        Ok(())
    }

    /// Resolve the image text policy for serving.
    ///
    /// Without an explicit setting the trained policy is used. An explicit
    /// setting must equal the trained one.
    pub fn resolve_policy(&self, configured: Option<&ImageTextPolicy>) -> Result<ImageTextPolicy, ArtifactError> {
        let trained = &self.metadata.image_text_policy;
        match configured {
            Some(policy) if policy != trained => Err(ArtifactError::PolicyMismatch {
                trained: trained.clone(),
                configured: policy.clone(),
            }),
            _ => Ok(trained.clone()),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        self.validate()?;

        fs::create_dir_all(dir).map_err(|source| ArtifactError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let file = ModelFile {
            metadata: self.metadata.clone(),
            model: self.model.clone(),
        };
        write_json(&dir.join(MODEL_FILE), &file)?;
        write_json(&dir.join(COLUMNS_FILE), &self.columns)?;

        tracing::info!("Model and columns saved to {}", dir.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let file: ModelFile = read_json(&dir.join(MODEL_FILE))?;
        let columns: Vec<String> = read_json(&dir.join(COLUMNS_FILE))?;

        let artifact = Self {
            model: file.model,
            metadata: file.metadata,
            columns,
        };
        artifact.validate()?;

        tracing::info!(
            "Loaded model from {} ({} trees, layout v{} {:08x})",
            dir.display(),
            artifact.model.tree_count(),
            artifact.metadata.feature_version,
            artifact.metadata.layout_hash
        );
        Ok(artifact)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};

    /// Small artifact over the real layout: score = 10 * has_cta + text_length / 10
    pub(crate) fn sample_artifact(policy: ImageTextPolicy) -> ModelArtifact {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let cta = (i % 2) as f64;
            let len = (i * 5) as f64;
            x.push(vec![len, cta, (i % 3) as f64, (i % 4) as f64, 0.0, 0.0]);
            y.push(10.0 * cta + len / 10.0);
        }

        let params = GbmParams { n_estimators: 20, ..Default::default() };
        let model = GradientBoostedRegressor::fit(params.clone(), layout::column_names(), &x, &y).unwrap();
        ModelArtifact::new(model, ModelMetadata::current(policy, params))
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = sample_artifact(ImageTextPolicy::AnyUrl);
        artifact.save(dir.path()).unwrap();

        let loaded = ModelArtifact::load(dir.path()).unwrap();
        assert_eq!(loaded.model, artifact.model);
        assert_eq!(loaded.metadata, artifact.metadata);
    }

    /// The persisted column file is exactly the serving layout
    #[test]
    fn test_persisted_columns_equal_feature_layout() {
        let dir = tempfile::tempdir().unwrap();
        sample_artifact(ImageTextPolicy::AnyUrl).save(dir.path()).unwrap();

        let raw = fs::read_to_string(dir.path().join(COLUMNS_FILE)).unwrap();
        let persisted: Vec<String> = serde_json::from_str(&raw).unwrap();

        let mut persisted_set = persisted.clone();
        persisted_set.sort();
        let mut layout_set: Vec<String> = layout::column_names();
        layout_set.sort();
        assert_eq!(persisted_set, layout_set);

        assert_eq!(persisted.len(), FEATURE_COUNT);
        assert_eq!(persisted, FEATURE_LAYOUT);
    }

    #[test]
    fn test_load_rejects_reordered_columns() {
        let dir = tempfile::tempdir().unwrap();
        sample_artifact(ImageTextPolicy::AnyUrl).save(dir.path()).unwrap();

        let mut columns = layout::column_names();
        columns.swap(0, 1);
        fs::write(dir.path().join(COLUMNS_FILE), serde_json::to_string(&columns).unwrap()).unwrap();

        let err = ModelArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Layout(LayoutMismatchError::ColumnOrder { index: 0, .. })));
    }

    #[test]
    fn test_load_rejects_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Read { .. }));

        sample_artifact(ImageTextPolicy::AnyUrl).save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(COLUMNS_FILE)).unwrap();
        assert!(matches!(ModelArtifact::load(dir.path()), Err(ArtifactError::Read { .. })));
    }

    #[test]
    fn test_load_rejects_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        sample_artifact(ImageTextPolicy::AnyUrl).save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), "not json").unwrap();

        assert!(matches!(ModelArtifact::load(dir.path()), Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn test_load_rejects_cyclic_tree() {
        let dir = tempfile::tempdir().unwrap();
        sample_artifact(ImageTextPolicy::AnyUrl).save(dir.path()).unwrap();

        let path = dir.path().join(MODEL_FILE);
        let mut file: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        file["model"]["trees"][0]["nodes"] = serde_json::json!([
            {"kind": "split", "feature": 0, "threshold": 1e300, "left": 0, "right": 0}
        ]);
        fs::write(&path, file.to_string()).unwrap();

        let err = ModelArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::CorruptTree(ModelError::CorruptTree { tree: 0, .. })));
    }

    #[test]
    fn test_validate_rejects_stale_layout_version() {
        let mut artifact = sample_artifact(ImageTextPolicy::AnyUrl);
        artifact.metadata.feature_version = FEATURE_VERSION + 1;

        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::Layout(LayoutMismatchError::Version { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_model_column_disagreement() {
        let artifact = sample_artifact(ImageTextPolicy::AnyUrl);

        let mut x = vec![vec![0.0; FEATURE_COUNT]; 3];
        x[1][0] = 1.0;
        let mut names = layout::column_names();
        names.swap(4, 5);
        let other = GradientBoostedRegressor::fit(GbmParams::default(), names, &x, &[0.0, 1.0, 2.0]).unwrap();

        let mismatched = ModelArtifact {
            model: other,
            ..artifact
        };
        assert!(matches!(mismatched.validate(), Err(ArtifactError::ModelColumns { .. })));
    }

    #[test]
    fn test_resolve_policy() {
        let artifact = sample_artifact(ImageTextPolicy::ContainsMarker("img2".to_string()));

        assert_eq!(
            artifact.resolve_policy(None).unwrap(),
            ImageTextPolicy::ContainsMarker("img2".to_string())
        );
        assert!(artifact
            .resolve_policy(Some(&ImageTextPolicy::ContainsMarker("img2".to_string())))
            .is_ok());
        assert!(matches!(
            artifact.resolve_policy(Some(&ImageTextPolicy::AnyUrl)),
            Err(ArtifactError::PolicyMismatch { .. })
        ));
    }
}
