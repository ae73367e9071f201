//! Ad prediction request/response

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::logic::features::AdRecord;

/// Body of `POST /predict`. An empty `ad_text` is a validation error, not a
/// zero-length ad.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(length(min = 1, max = 5000, message = "ad_text must be 1-5000 characters"))]
    pub ad_text: String,

    #[validate(length(max = 2048, message = "image_url must be at most 2048 characters"))]
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PredictRequest {
    pub fn into_record(self) -> AdRecord {
        AdRecord::new(self.ad_text, self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthicalRiskAssessment {
    pub creepiness_score: u32,
    pub urgency_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_performance_score: f64,
    pub ethical_risk_assessment: EthicalRiskAssessment,
}
