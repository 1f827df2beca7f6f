//! Basic location search functionality
//!
//! This example demonstrates the fundamental navigation operations:
//! - Wiring a navigator with your own provider implementations
//! - The built-in landmark shortlist that works with no network at all
//! - Live suggestions while typing and resolution on submit

use std::sync::Arc;

use async_trait::async_trait;
use meridian::{
    Feature, FeatureKind, LngLat, Navigator, NavigatorConfig, PlacePayload, PlaceProvider,
    ProviderKind, RecordSource, RelatedRecords, SessionToken, SuggestOptions, Suggestion,
};
use tokio_util::sync::CancellationToken;

const CITIES: &[(&str, &str, f64, f64)] = &[
    ("Paris", "France", 2.3522, 48.8566),
    ("Parma", "Italy", 10.3279, 44.8015),
    ("Patna", "Bihar, India", 85.1376, 25.5941),
];

/// In-memory geocoder over a tiny city table, so the example needs no
/// credentials or network.
struct DemoGeocoder;

impl DemoGeocoder {
    fn matching(query: &str) -> Vec<Suggestion> {
        let needle = query.to_lowercase();
        CITIES
            .iter()
            .filter(|(name, ..)| name.to_lowercase().starts_with(&needle))
            .map(|(name, subtitle, lng, lat)| Suggestion {
                id: format!("demo.{}", name.to_lowercase()),
                name: (*name).to_owned(),
                subtitle: (*subtitle).to_owned(),
                kind: FeatureKind::Place,
                origin: ProviderKind::Geocoder,
                feature: Some(
                    Feature::new(LngLat::new(*lng, *lat), format!("{name}, {subtitle}"))
                        .with_kind(FeatureKind::Place),
                ),
            })
            .collect()
    }
}

#[async_trait]
impl PlaceProvider for DemoGeocoder {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Geocoder
    }

    async fn suggest(
        &self,
        query: &str,
        _options: &SuggestOptions,
        _session: &SessionToken,
        _cancel: &CancellationToken,
    ) -> meridian::providers::Result<Vec<Suggestion>> {
        Ok(Self::matching(query))
    }

    async fn search(
        &self,
        query: &str,
        _focused: bool,
        _cancel: &CancellationToken,
    ) -> meridian::providers::Result<Option<Feature>> {
        Ok(Self::matching(query)
            .into_iter()
            .next()
            .and_then(|suggestion| suggestion.feature))
    }
}

/// Providers with nothing to contribute lean on the trait's empty defaults.
struct Silent(ProviderKind);

#[async_trait]
impl PlaceProvider for Silent {
    fn kind(&self) -> ProviderKind {
        self.0
    }
}

struct NoRecords;

#[async_trait]
impl RecordSource for NoRecords {
    async fn related_records(
        &self,
        _place: &PlacePayload,
        _limit: usize,
        _offset: usize,
        _cancel: &CancellationToken,
    ) -> meridian::providers::Result<RelatedRecords> {
        Ok(RelatedRecords::default())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let nav = Navigator::with_providers(
        NavigatorConfig::default(),
        Arc::new(Silent(ProviderKind::SearchBox)),
        Arc::new(DemoGeocoder),
        Arc::new(Silent(ProviderKind::Places)),
        Arc::new(NoRecords),
        None,
    );

    // The landmark table answers famous names before any provider is asked.
    nav.open_session();
    println!("Typing 'eiffel to':");
    print_shortlist(&nav.update_query("eiffel to").await?);

    // Live suggestions from the demo geocoder, ranked and deduplicated.
    println!("\nTyping 'par':");
    print_shortlist(&nav.update_query("par").await?);

    // Resolution on Enter.
    let feature = nav.submit("paris").await?;
    println!(
        "\nResolved: {} at ({:.4}, {:.4})",
        feature.display, feature.center.lng, feature.center.lat
    );

    Ok(())
}

fn print_shortlist(shortlist: &[Suggestion]) {
    for (i, suggestion) in shortlist.iter().enumerate() {
        println!(
            "  {}. {} ({}) [{:?}]",
            i + 1,
            suggestion.name,
            suggestion.subtitle,
            suggestion.origin
        );
    }
}
