//! Feature Builder - AdRecord → FeatureVector
//!
//! The one feature function used by both the training pipeline and the
//! prediction endpoint.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::keywords::{PRIVACY_KEYWORDS, URGENCY_KEYWORDS};
use super::sentiment::{SentimentScorer, VaderScorer};
use super::vector::{FeatureVector, FeatureVectorBuilder};

static CTA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)shop now|learn more|order today|enroll").expect("valid CTA pattern")
});

/// Serving-time ad input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdRecord {
    pub ad_text: String,
    pub image_url: Option<String>,
}

impl AdRecord {
    pub fn new(ad_text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            ad_text: ad_text.into(),
            image_url,
        }
    }
}

// ============================================================================
// IMAGE TEXT POLICY
// ============================================================================

/// Rule deciding the `has_image_text` flag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageTextPolicy {
    /// 1 if any non-blank image URL is present
    #[default]
    AnyUrl,
    /// 1 if the image URL contains the marker substring
    ContainsMarker(String),
}

impl ImageTextPolicy {
    pub fn has_image_text(&self, image_url: Option<&str>) -> bool {
        let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return false;
        };

        match self {
            ImageTextPolicy::AnyUrl => true,
            ImageTextPolicy::ContainsMarker(marker) => url.contains(marker.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid image text policy '{0}' (expected 'any_url' or 'contains:<marker>')")]
pub struct ParsePolicyError(String);

impl FromStr for ImageTextPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("any_url") {
            return Ok(ImageTextPolicy::AnyUrl);
        }

        match s.split_once(':') {
            Some((kind, marker)) if kind.eq_ignore_ascii_case("contains") && !marker.is_empty() => {
                Ok(ImageTextPolicy::ContainsMarker(marker.to_string()))
            }
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for ImageTextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageTextPolicy::AnyUrl => write!(f, "any_url"),
            ImageTextPolicy::ContainsMarker(marker) => write!(f, "contains:{}", marker),
        }
    }
}

impl Serialize for ImageTextPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageTextPolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// FEATURE BUILDER
// ============================================================================

/// Features plus the risk counts surfaced to API callers
#[derive(Debug, Clone, PartialEq)]
pub struct AdFeatures {
    pub vector: FeatureVector,
    pub creepiness_score: u32,
    pub urgency_score: u32,
}

pub struct FeatureBuilder {
    scorer: Box<dyn SentimentScorer>,
    image_policy: ImageTextPolicy,
}

impl FeatureBuilder {
    pub fn new(image_policy: ImageTextPolicy) -> Self {
        Self::with_scorer(Box::new(VaderScorer::new()), image_policy)
    }

    pub fn with_scorer(scorer: Box<dyn SentimentScorer>, image_policy: ImageTextPolicy) -> Self {
        Self { scorer, image_policy }
    }

    pub fn image_policy(&self) -> &ImageTextPolicy {
        &self.image_policy
    }

    pub fn build(&self, ad: &AdRecord) -> AdFeatures {
        let text = ad.ad_text.as_str();
        let creepiness_score = PRIVACY_KEYWORDS.count(text);
        let urgency_score = URGENCY_KEYWORDS.count(text);

        let vector = FeatureVectorBuilder::new()
            .text_length(text.chars().count())
            .has_cta(has_cta(text))
            .creepiness_score(creepiness_score)
            .urgency_score(urgency_score)
            .sentiment(self.scorer.compound(text))
            .has_image_text(self.image_policy.has_image_text(ad.image_url.as_deref()))
            .build();

        AdFeatures {
            vector,
            creepiness_score,
            urgency_score,
        }
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(ImageTextPolicy::default())
    }
}

impl fmt::Debug for FeatureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureBuilder")
            .field("image_policy", &self.image_policy)
            .finish_non_exhaustive()
    }
}

/// Case-insensitive call-to-action check
pub fn has_cta(text: &str) -> bool {
    CTA_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::sentiment::ConstantScorer;

    fn builder(policy: ImageTextPolicy) -> FeatureBuilder {
        FeatureBuilder::with_scorer(Box::new(ConstantScorer(0.25)), policy)
    }

    #[test]
    fn test_has_cta() {
        assert!(has_cta("Shop Now for deals"));
        assert!(has_cta("click to LEARN MORE"));
        assert!(has_cta("Enrollment is open"));
        assert!(!has_cta("buy today"));
        assert!(!has_cta(""));
    }

    #[test]
    fn test_build_orders_features_by_layout() {
        let ad = AdRecord::new(
            "Based on your recent activity, hurry, offer expires today! Shop now.",
            Some("https://cdn.example.com/img1.png".to_string()),
        );

        let features = builder(ImageTextPolicy::AnyUrl).build(&ad);
        let expected_len = ad.ad_text.chars().count() as f64;

        assert_eq!(features.creepiness_score, 2);
        assert_eq!(features.urgency_score, 2);
        assert_eq!(features.vector.values, [expected_len, 1.0, 2.0, 2.0, 0.25, 1.0]);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let features = builder(ImageTextPolicy::AnyUrl).build(&AdRecord::new("héllo 🔥", None));
        assert_eq!(features.vector.get_by_name("text_length"), Some(7.0));
    }

    #[test]
    fn test_any_url_policy() {
        let policy = ImageTextPolicy::AnyUrl;
        assert!(policy.has_image_text(Some("https://x/img1.jpg")));
        assert!(!policy.has_image_text(Some("")));
        assert!(!policy.has_image_text(Some("   ")));
        assert!(!policy.has_image_text(None));
    }

    #[test]
    fn test_contains_marker_policy() {
        let policy: ImageTextPolicy = "contains:img2".parse().unwrap();
        assert_eq!(policy, ImageTextPolicy::ContainsMarker("img2".to_string()));
        assert!(policy.has_image_text(Some("https://x/img2.jpg")));
        assert!(!policy.has_image_text(Some("https://x/img1.jpg")));
        assert!(!policy.has_image_text(None));
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("any_url".parse::<ImageTextPolicy>(), Ok(ImageTextPolicy::AnyUrl));
        assert_eq!(ImageTextPolicy::ContainsMarker("img2".into()).to_string(), "contains:img2");
        assert!("contains:".parse::<ImageTextPolicy>().is_err());
        assert!("always".parse::<ImageTextPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_as_string() {
        let json = serde_json::to_string(&ImageTextPolicy::ContainsMarker("img2".into())).unwrap();
        assert_eq!(json, "\"contains:img2\"");

        let back: ImageTextPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ImageTextPolicy::ContainsMarker("img2".into()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = FeatureBuilder::default();
        let ad = AdRecord::new("Limited time: people like you love this!", None);
        assert_eq!(builder.build(&ad), builder.build(&ad));
    }
}
