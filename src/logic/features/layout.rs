//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared by training and serving**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! A model artifact records the version, hash and column list it was trained
//! with. Serving refuses to load an artifact whose columns differ from this
//! layout in membership or order.

use crc32fast::Hasher;
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "text_length",      // 0: Character count of the ad copy
    "has_cta",          // 1: 1 if a call-to-action phrase is present
    "creepiness_score", // 2: Privacy keyword hits
    "urgency_score",    // 3: Urgency/scarcity keyword hits
    "sentiment",        // 4: Compound sentiment in [-1, 1]
    "has_image_text",   // 5: Image-text flag (see ImageTextPolicy)
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 6;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    hash_columns(FEATURE_VERSION, FEATURE_LAYOUT.iter().copied())
}

/// Hash an arbitrary column list the same way the layout is hashed
pub fn hash_columns<'a>(version: u8, columns: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[version]);

    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

/// Layout column names as owned strings (the persisted column file format)
pub fn column_names() -> Vec<String> {
    FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a feature layout doesn't match the compiled one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutMismatchError {
    #[error("Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), got v{actual_version} (hash: {actual_hash:08x})")]
    Version {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("Column count mismatch: expected {expected}, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Column order mismatch at position {index}: expected '{expected}', got '{actual}'")]
    ColumnOrder {
        index: usize,
        expected: String,
        actual: String,
    },
}

/// Validate that incoming version/hash match current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError::Version {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Validate a persisted column list against the layout.
///
/// Membership is checked before order so the error names the real problem:
/// an extra or missing column rather than the first shifted position.
pub fn validate_columns<S: AsRef<str>>(columns: &[S]) -> Result<(), LayoutMismatchError> {
    for column in columns {
        if feature_index(column.as_ref()).is_none() {
            return Err(LayoutMismatchError::UnknownColumn(column.as_ref().to_string()));
        }
    }

    for expected in FEATURE_LAYOUT {
        if !columns.iter().any(|c| c.as_ref() == *expected) {
            return Err(LayoutMismatchError::MissingColumn(expected.to_string()));
        }
    }

    if columns.len() != FEATURE_COUNT {
        return Err(LayoutMismatchError::ColumnCount {
            expected: FEATURE_COUNT,
            actual: columns.len(),
        });
    }

    for (index, (expected, actual)) in FEATURE_LAYOUT.iter().zip(columns).enumerate() {
        if *expected != actual.as_ref() {
            return Err(LayoutMismatchError::ColumnOrder {
                index,
                expected: expected.to_string(),
                actual: actual.as_ref().to_string(),
            });
        }
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================
