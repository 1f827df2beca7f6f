//! Suggestion scoring and ordering.
//!
//! A suggestion's score is its type weight (picked from the broad, specific
//! or street-query table) plus text-match bonuses minus mismatch penalties.
//! Sorting is stable, so equal scores keep their aggregation order.

use meridian_providers::{FeatureKind, Intent, Suggestion};

use crate::intent::{STREET_WORDS, normalize_query};

/// Names containing one of these read as businesses rather than places; they
/// are pushed down on short queries unless the name starts with the query.
const NOISE_WORDS: &[&str] = &[
    "court",
    "hotel",
    "office",
    "church",
    "corporation",
    "jewellers",
    "database",
];

/// Fixed (query, country) pairs that break ties for famously ambiguous city
/// names. Both sides are in normalized form.
const AFFINITY_PAIRS: &[(&str, &str)] = &[
    ("london", "united kingdom"),
    ("paris", "france"),
    ("dubai", "united arab emirates"),
    ("sydney", "australia"),
    ("melbourne", "australia"),
    ("moscow", "russia"),
    ("dublin", "ireland"),
    ("birmingham", "united kingdom"),
    ("manchester", "united kingdom"),
    ("athens", "greece"),
    ("naples", "italy"),
];

const EXACT_NORMALIZED_BONUS: i32 = 180;
const PREFIX_NORMALIZED_BONUS: i32 = 95;
const EXACT_RAW_BONUS: i32 = 70;
const PREFIX_RAW_BONUS: i32 = 45;
const SUBSTRING_RAW_BONUS: i32 = 18;
const TOKEN_COVERAGE_BONUS: i32 = 50;
const TOKEN_COVERAGE_PENALTY: i32 = 60;
const LOOSE_POI_PENALTY: i32 = 25;
const NOISE_NAME_PENALTY: i32 = 50;
const COUNTRY_AFFINITY_BONUS: i32 = 90;

/// Score one suggestion against the query. Higher is better.
pub fn score(suggestion: &Suggestion, query: &str, intent: Intent) -> i32 {
    let normalized_query = normalize_query(query);
    let raw_query = query.trim().to_lowercase();
    let normalized_name = normalize_query(&suggestion.name);
    let raw_name = suggestion.name.to_lowercase();
    let normalized_subtitle = normalize_query(&suggestion.subtitle);

    let mut total = type_weight(suggestion.kind, intent, &normalized_query);

    if !normalized_query.is_empty() {
        if normalized_name == normalized_query {
            total += EXACT_NORMALIZED_BONUS;
        } else if normalized_name.starts_with(&normalized_query) {
            total += PREFIX_NORMALIZED_BONUS;
        }
        if raw_name == raw_query {
            total += EXACT_RAW_BONUS;
        } else if raw_name.starts_with(&raw_query) {
            total += PREFIX_RAW_BONUS;
        } else if raw_name.contains(&raw_query) {
            total += SUBSTRING_RAW_BONUS;
        }
    }

    let tokens: Vec<&str> = normalized_query.split_whitespace().collect();
    if !tokens.is_empty() {
        let haystack = format!("{normalized_name} {normalized_subtitle}");
        if tokens.iter().all(|token| haystack.contains(token)) {
            total += TOKEN_COVERAGE_BONUS;
        } else {
            total -= TOKEN_COVERAGE_PENALTY;
        }
    }
    if tokens.len() >= 2
        && suggestion.kind == FeatureKind::Poi
        && !normalized_name.contains(&normalized_query)
    {
        total -= LOOSE_POI_PENALTY;
    }
    if tokens.len() <= 2
        && NOISE_WORDS.iter().any(|word| normalized_name.contains(word))
        && !normalized_name.starts_with(&normalized_query)
    {
        total -= NOISE_NAME_PENALTY;
    }
    for (city, country) in AFFINITY_PAIRS {
        if normalized_query == *city && normalized_subtitle.ends_with(country) {
            total += COUNTRY_AFFINITY_BONUS;
            break;
        }
    }
    total
}

/// Stable-sort suggestions by descending score; equal scores keep their
/// incoming order.
pub fn rank(suggestions: Vec<Suggestion>, query: &str, intent: Intent) -> Vec<Suggestion> {
    let mut scored: Vec<(i32, Suggestion)> = suggestions
        .into_iter()
        .map(|suggestion| (score(&suggestion, query, intent), suggestion))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, suggestion)| suggestion).collect()
}

fn type_weight(kind: FeatureKind, intent: Intent, normalized_query: &str) -> i32 {
    match intent {
        Intent::Broad => broad_weight(kind),
        Intent::Specific if looks_like_street_query(normalized_query) => street_weight(kind),
        Intent::Specific => specific_weight(kind),
    }
}

fn looks_like_street_query(normalized_query: &str) -> bool {
    normalized_query.chars().any(|c| c.is_ascii_digit())
        || normalized_query
            .split_whitespace()
            .any(|token| STREET_WORDS.contains(&token))
}

const fn broad_weight(kind: FeatureKind) -> i32 {
    match kind {
        FeatureKind::Place => 95,
        FeatureKind::Locality => 88,
        FeatureKind::Region => 80,
        FeatureKind::Country => 75,
        FeatureKind::District => 60,
        FeatureKind::Neighborhood => 55,
        FeatureKind::Poi => 40,
        FeatureKind::Postcode => 30,
        FeatureKind::Street => 25,
        FeatureKind::Address => 20,
    }
}

const fn specific_weight(kind: FeatureKind) -> i32 {
    match kind {
        FeatureKind::Poi => 90,
        FeatureKind::Address => 85,
        FeatureKind::Street => 70,
        FeatureKind::District => 50,
        FeatureKind::Neighborhood => 48,
        FeatureKind::Postcode => 45,
        FeatureKind::Place => 40,
        FeatureKind::Locality => 35,
        FeatureKind::Region => 20,
        FeatureKind::Country => 12,
    }
}

const fn street_weight(kind: FeatureKind) -> i32 {
    match kind {
        FeatureKind::Address => 95,
        FeatureKind::Street => 90,
        FeatureKind::Poi => 60,
        FeatureKind::Postcode => 50,
        FeatureKind::District => 35,
        FeatureKind::Neighborhood => 32,
        FeatureKind::Place => 25,
        FeatureKind::Locality => 22,
        FeatureKind::Region => 10,
        FeatureKind::Country => 5,
    }
}
