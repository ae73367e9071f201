//! Features Module - Feature Extraction Engine
//!
//! Turns an ad (copy + optional image URL) into the fixed-order numeric
//! vector consumed by the regression model.

pub mod layout;
pub mod vector;
pub mod keywords;
pub mod sentiment;
pub mod builder;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutMismatchError};
pub use vector::{FeatureVector, FeatureVectorBuilder};
pub use keywords::{KeywordSet, PRIVACY_KEYWORDS, URGENCY_KEYWORDS};
pub use sentiment::{SentimentScorer, VaderScorer};
pub use builder::{AdFeatures, AdRecord, FeatureBuilder, ImageTextPolicy};
