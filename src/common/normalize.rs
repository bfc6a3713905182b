//! Keyword and location normalization.
//!
//! Every tier keys its counts by the canonical form produced here, so two
//! requests that differ only in case, surrounding whitespace, or punctuation
//! land on the same tally.

/// Normalize a raw search keyword to its canonical form.
///
/// Trims, lowercases, collapses runs of whitespace to a single space, and
/// strips characters that are neither alphanumeric nor whitespace. Unicode
/// letters (e.g. Hangul) are kept. A keyword that is blank after
/// normalization returns an empty string; callers treat that as a no-op.
pub fn normalize_keyword(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a location category name.
///
/// More lenient than keyword normalization: trims, lowercases, and collapses
/// whitespace, but keeps punctuation (location names like "st. paul" are
/// valid). The same canonical form is used for cache keys and for the
/// `location_categories` row, so every tier agrees on scope identity.
pub fn normalize_location(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
