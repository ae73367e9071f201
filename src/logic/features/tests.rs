//! Integration Tests for Feature Extraction
//!
//! Checks the builder, keyword sets and layout together.

#[cfg(test)]
mod integration_tests {
    use crate::logic::features::{
        layout::{self, FEATURE_COUNT, FEATURE_LAYOUT},
        sentiment::ConstantScorer,
        AdRecord, FeatureBuilder, ImageTextPolicy, PRIVACY_KEYWORDS, URGENCY_KEYWORDS,
    };

    const SAMPLES: &[&str] = &[
        "",
        "Shop Now for deals",
        "buy today",
        "We Saw You looked at these shoes. Your friends already bought them!",
        "HURRY! Only a few left. Don't miss out, last chance, 24-hour sale, now or never.",
        "Limited time: today only, offer expires at midnight. Learn more.",
        "Based on your recent activity, hurry, offer expires today!",
        "Enroll in our course. People like you know you like learning.",
        "日本語の広告テキスト 🔥🔥",
    ];

    /// Risk scores stay within the keyword set sizes for every input
    #[test]
    fn test_scores_bounded_by_set_sizes() {
        let builder = FeatureBuilder::with_scorer(Box::new(ConstantScorer(0.0)), ImageTextPolicy::AnyUrl);

        for text in SAMPLES {
            let features = builder.build(&AdRecord::new(*text, None));
            assert!(features.creepiness_score as usize <= PRIVACY_KEYWORDS.len(), "{}", text);
            assert!(features.urgency_score as usize <= URGENCY_KEYWORDS.len(), "{}", text);
        }
    }

    /// Vector values mirror the reported risk counts
    #[test]
    fn test_vector_matches_reported_scores() {
        let builder = FeatureBuilder::default();

        for text in SAMPLES {
            let features = builder.build(&AdRecord::new(*text, None));
            let vector = &features.vector;

            assert_eq!(vector.get_by_name("creepiness_score"), Some(features.creepiness_score as f64));
            assert_eq!(vector.get_by_name("urgency_score"), Some(features.urgency_score as f64));
            assert!(vector.is_compatible());
        }
    }

    /// Upper and lower case copies produce identical vectors
    #[test]
    fn test_case_insensitive_features() {
        let builder = FeatureBuilder::with_scorer(Box::new(ConstantScorer(0.1)), ImageTextPolicy::AnyUrl);

        for text in SAMPLES {
            let upper = builder.build(&AdRecord::new(text.to_uppercase(), None));
            let lower = builder.build(&AdRecord::new(text.to_lowercase(), None));

            assert_eq!(upper.creepiness_score, lower.creepiness_score, "{}", text);
            assert_eq!(upper.urgency_score, lower.urgency_score, "{}", text);
            assert_eq!(upper.vector.get_by_name("has_cta"), lower.vector.get_by_name("has_cta"));
        }
    }

    #[test]
    fn test_all_urgency_phrases_detected() {
        let builder = FeatureBuilder::default();
        let features = builder.build(&AdRecord::new(SAMPLES[4], None));
        assert_eq!(features.urgency_score, 6);
    }

    /// Feature names come out in the persisted column order
    #[test]
    fn test_vector_names_equal_layout_columns() {
        let features = FeatureBuilder::default().build(&AdRecord::default());
        let names: Vec<String> = features.vector.feature_names().iter().map(|s| s.to_string()).collect();

        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names, layout::column_names());
        assert!(layout::validate_columns(&names).is_ok());
        assert_eq!(features.vector.feature_names(), FEATURE_LAYOUT);
    }

    #[test]
    fn test_image_policies_only_change_image_flag() {
        let ad = AdRecord::new("Learn more", Some("https://cdn.example.com/img1.png".to_string()));

        let any = FeatureBuilder::with_scorer(Box::new(ConstantScorer(0.0)), ImageTextPolicy::AnyUrl).build(&ad);
        let marker = FeatureBuilder::with_scorer(
            Box::new(ConstantScorer(0.0)),
            ImageTextPolicy::ContainsMarker("img2".to_string()),
        )
        .build(&ad);

        assert_eq!(any.vector.get_by_name("has_image_text"), Some(1.0));
        assert_eq!(marker.vector.get_by_name("has_image_text"), Some(0.0));
        assert_eq!(any.vector.values[..5], marker.vector.values[..5]);
    }
}
