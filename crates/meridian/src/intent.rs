//! Query intent classification.
//!
//! A query is either `Broad` (a place or region name, resolved through the
//! forward geocoder) or `Specific` (an address, poi or landmark, resolved
//! through the focused search path). Classification is pure string
//! inspection, no I/O and no failure mode.

use once_cell::sync::Lazy;
use regex::Regex;

pub use meridian_providers::Intent;

/// Words that mark a query as a street address when they appear as a token.
pub(crate) const STREET_WORDS: &[&str] = &[
    "st", "street", "ave", "avenue", "rd", "road", "blvd", "boulevard", "dr", "drive", "ln",
    "lane", "ct", "court", "pl", "place", "sq", "square", "way", "hwy", "highway", "pkwy",
    "parkway", "terrace",
];

/// Words that mark a query as a named landmark rather than an area.
const LANDMARK_WORDS: &[&str] = &[
    "tower", "bridge", "museum", "palace", "castle", "cathedral", "temple", "shrine", "stadium",
    "airport", "station", "monument", "statue", "gate", "opera",
];

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("Failed to compile normalization regex"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Lowercase, strip punctuation, collapse whitespace.
///
/// Cache keys, ranking comparisons and landmark alias matches all operate on
/// this form so that "Tokyo!!" and " tokyo " meet in the middle.
pub fn normalize_query(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Classify a raw query.
///
/// `Specific` when the query carries a digit, a comma, three or more
/// whitespace tokens, a street-type word, or a landmark keyword; `Broad`
/// otherwise. Empty and whitespace-only input is `Broad`.
///
/// # Examples
///
/// ```rust
/// use meridian::{Intent, classify};
///
/// assert_eq!(classify("tokyo"), Intent::Broad);
/// assert_eq!(classify("350 5th Ave"), Intent::Specific);
/// assert_eq!(classify("eiffel tower"), Intent::Specific);
/// ```
pub fn classify(query: &str) -> Intent {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return Intent::Broad;
    }
    if query.contains(',') || normalized.chars().any(|c| c.is_ascii_digit()) {
        return Intent::Specific;
    }
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.len() >= 3 {
        return Intent::Specific;
    }
    if tokens
        .iter()
        .any(|token| STREET_WORDS.contains(token) || LANDMARK_WORDS.contains(token))
    {
        return Intent::Specific;
    }
    Intent::Broad
}
