//! Sentiment scoring
//!
//! Lexicon-based compound polarity via the VADER analyzer.

/// Maps text to a single compound polarity score, typically in [-1, 1]
pub trait SentimentScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// VADER compound score
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        // Lexicons are static; the analyzer itself holds no state
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Fixed score, for tests and offline dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantScorer(pub f64);

impl SentimentScorer for ConstantScorer {
    fn compound(&self, _text: &str) -> f64 {
        self.0
    }
}
