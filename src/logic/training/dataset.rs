//! Historical ad dataset
//!
//! CSV with header `ad_id,ad_text,image_url,impressions,spend`. Each row is
//! turned into features with the same builder the server uses.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::{layout, AdRecord, FeatureBuilder};

/// Added to spend so zero-spend ads don't divide by zero
pub const SPEND_EPSILON: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid row {row} (ad {ad_id}): {reason}")]
    InvalidRow {
        row: usize,
        ad_id: String,
        reason: String,
    },

    #[error("Dataset is empty")]
    Empty,
}

/// One historical ad with known delivery results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSample {
    pub ad_id: String,
    pub ad_text: String,
    pub image_url: Option<String>,
    pub impressions: f64,
    pub spend: f64,
}

impl AdSample {
    /// Impressions per unit of spend
    pub fn performance_score(&self) -> f64 {
        self.impressions / (self.spend + SPEND_EPSILON)
    }

    pub fn to_record(&self) -> AdRecord {
        AdRecord::new(self.ad_text.clone(), self.image_url.clone())
    }

    fn check(&self, row: usize) -> Result<(), DatasetError> {
        let reason = if !self.impressions.is_finite() || self.impressions < 0.0 {
            "impressions must be a non-negative number"
        } else if !self.spend.is_finite() || self.spend < 0.0 {
            "spend must be a non-negative number"
        } else {
            return Ok(());
        };

        Err(DatasetError::InvalidRow {
            row,
            ad_id: self.ad_id.clone(),
            reason: reason.to_string(),
        })
    }
}

/// Load samples from a CSV file
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<AdSample>, DatasetError> {
    read_samples(csv::Reader::from_path(path)?)
}

/// Read samples from any CSV source
pub fn read_samples<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<AdSample>, DatasetError> {
    let mut samples = Vec::new();

    for (row, result) in reader.deserialize::<AdSample>().enumerate() {
        let sample = result?;
        sample.check(row + 1)?;
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }

    tracing::info!("Loaded {} ad samples", samples.len());
    Ok(samples)
}

/// Feature matrix with targets, columns in layout order
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn from_samples(samples: &[AdSample], builder: &FeatureBuilder) -> Self {
        let features = samples
            .iter()
            .map(|s| builder.build(&s.to_record()).vector.as_slice().to_vec())
            .collect();
        let targets = samples.iter().map(AdSample::performance_score).collect();

        Self {
            feature_names: layout::column_names(),
            features,
            targets,
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of held-out rows for a test fraction
    pub fn test_rows(&self, test_size: f64) -> usize {
        (self.len() as f64 * test_size).ceil() as usize
    }

    /// Shuffle with a seeded RNG and hold out `ceil(n * test_size)` rows
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> (Dataset, Dataset) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = self.test_rows(test_size).min(self.len());
        let (test_idx, train_idx) = indices.split_at(n_test);

        (self.subset(train_idx), self.subset(test_idx))
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}
