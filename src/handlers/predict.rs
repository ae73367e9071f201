//! Prediction handler

use axum::{extract::State, Json};
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::logic::features::{PRIVACY_KEYWORDS, URGENCY_KEYWORDS};
use crate::models::{EthicalRiskAssessment, PredictRequest, PredictResponse};

/// Predict ad performance and report ethical risk scores.
///
/// Empty `ad_text` is rejected with 400 here rather than scored; the form
/// page blocks it too, but the server does not rely on that.
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    req.validate()?;
    let ad = req.into_record();

    // Sentiment scoring and tree evaluation are CPU-bound
    let result = tokio::task::spawn_blocking(move || {
        let features = state.features.build(&ad);
        tracing::debug!(features = %features.vector.to_log_entry(), "Calculated features");
        tracing::debug!(
            privacy = ?PRIVACY_KEYWORDS.matches(&ad.ad_text),
            urgency = ?URGENCY_KEYWORDS.matches(&ad.ad_text),
            "Risk keyword hits"
        );

        state
            .predictor
            .predict(&features.vector)
            .map(|score| (score, features))
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    let (score, features) = result?;

    Ok(Json(PredictResponse {
        predicted_performance_score: score,
        ethical_risk_assessment: EthicalRiskAssessment {
            creepiness_score: features.creepiness_score,
            urgency_score: features.urgency_score,
        },
    }))
}
