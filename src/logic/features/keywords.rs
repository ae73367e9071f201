//! Keyword sets for ethical risk scoring
//!
//! Matching is plain substring matching on lowercased text. Phrases are not
//! tokenized and ignore word boundaries, so a keyword inside a larger word
//! still counts.

/// Immutable named set of short phrases
#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    name: &'static str,
    phrases: &'static [&'static str],
}

/// Privacy-invasive ("creepy") phrases
pub const PRIVACY_KEYWORDS: KeywordSet = KeywordSet::new(
    "privacy",
    &[
        "your friend",
        "your friends",
        "we saw you",
        "based on your",
        "people like you",
        "your recent activity",
        "know you like",
        "saw you looked at",
    ],
);

/// Urgency / scarcity pressure phrases
pub const URGENCY_KEYWORDS: KeywordSet = KeywordSet::new(
    "urgency",
    &[
        "limited time",
        "only a few left",
        "offer expires",
        "don't miss out",
        "today only",
        "hurry",
        "last chance",
        "24-hour",
        "now or never",
    ],
);

impl KeywordSet {
    pub const fn new(name: &'static str, phrases: &'static [&'static str]) -> Self {
        Self { name, phrases }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phrases(&self) -> &'static [&'static str] {
        self.phrases
    }

    /// Upper bound for `count`
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Number of phrases occurring in `text` (each phrase counts once)
    pub fn count(&self, text: &str) -> u32 {
        let lowered = text.to_lowercase();
        self.phrases
            .iter()
            .filter(|phrase| lowered.contains(*phrase))
            .count() as u32
    }

    /// Phrases occurring in `text`, in set order
    pub fn matches(&self, text: &str) -> Vec<&'static str> {
        let lowered = text.to_lowercase();
        self.phrases
            .iter()
            .copied()
            .filter(|phrase| lowered.contains(phrase))
            .collect()
    }
}
