//! Commercial text-search client.
//!
//! Runs alongside the primary suggest path and contributes business/poi
//! matches the geocoders miss. A permission or quota refusal trips a circuit
//! breaker: the provider stays disabled for the rest of the session and every
//! later call returns empty immediately.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    ProviderError, Result,
    adapter::{PlaceProvider, SuggestOptions},
    http::{ProviderConfig, build_client, read_json, run_cancellable},
    model::{BoundingBox, Feature, FeatureKind, LngLat, ProviderKind, SessionToken, Suggestion},
};

const MAX_RESULTS: usize = 20;

/// Shown to the user when the breaker trips, alongside the provider detail.
const REMEDIATION_HINT: &str =
    "commercial search is disabled for this session; check that the API key is valid and the service is enabled";

/// Client for the commercial places text-search provider.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    client: reqwest::Client,
    base: String,
    key: String,
    disabled: Arc<AtomicBool>,
}

impl PlacesClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            base: config.places_base.clone(),
            key: config.places_key.clone(),
            disabled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether the circuit breaker has tripped this session.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    fn open_breaker(&self, detail: &str) -> ProviderError {
        self.disabled.store(true, Ordering::Relaxed);
        warn!(detail, "commercial search disabled for this session");
        ProviderError::Permission(format!("{REMEDIATION_HINT} ({detail})"))
    }

    async fn text_search(&self, query: &str, options: &SuggestOptions) -> Result<Vec<Suggestion>> {
        let body = TextSearchRequest {
            text_query: query,
            language_code: &options.language,
            max_result_count: options.limit.min(MAX_RESULTS),
        };
        let response = self
            .client
            .post(format!("{}/places:searchText", self.base))
            .header("X-Goog-Api-Key", &self.key)
            .header(
                "X-Goog-FieldMask",
                "places.id,places.displayName,places.formattedAddress,places.location,places.types,places.viewport",
            )
            .json(&body)
            .send()
            .await?;
        let parsed: TextSearchResponse = read_json(response, "places").await?;
        Ok(parsed
            .places
            .into_iter()
            .map(WirePlace::into_suggestion)
            .collect())
    }
}

#[async_trait]
impl PlaceProvider for PlacesClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Places
    }

    #[instrument(level = "debug", skip(self, options, _session, cancel))]
    async fn suggest(
        &self,
        query: &str,
        options: &SuggestOptions,
        _session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        if self.is_disabled() {
            debug!("circuit open, skipping commercial search");
            return Ok(Vec::new());
        }
        let Some(outcome) = run_cancellable(cancel, self.text_search(query, options)).await else {
            debug!("suggest cancelled");
            return Ok(Vec::new());
        };
        match outcome {
            Err(ProviderError::Permission(detail)) => Err(self.open_breaker(&detail)),
            other => other,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextSearchRequest<'a> {
    text_query: &'a str,
    language_code: &'a str,
    max_result_count: usize,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    places: Vec<WirePlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlace {
    #[serde(default)]
    id: String,
    display_name: WireLocalizedText,
    #[serde(default)]
    formatted_address: String,
    location: WireLocation,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    viewport: Option<WireViewport>,
}

#[derive(Debug, Deserialize)]
struct WireLocalizedText {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct WireViewport {
    low: WireLocation,
    high: WireLocation,
}

impl WirePlace {
    fn into_suggestion(self) -> Suggestion {
        let kind = kind_from_types(&self.types);
        let center = LngLat::new(self.location.longitude, self.location.latitude);
        let display = if self.formatted_address.is_empty() {
            self.display_name.text.clone()
        } else {
            format!("{}, {}", self.display_name.text, self.formatted_address)
        };
        let mut feature = Feature::new(center, display).with_kind(kind);
        if let Some(viewport) = self.viewport {
            feature = feature.with_bbox(BoundingBox::new(
                viewport.low.longitude,
                viewport.low.latitude,
                viewport.high.longitude,
                viewport.high.latitude,
            ));
        }
        Suggestion {
            id: self.id,
            name: self.display_name.text,
            subtitle: self.formatted_address,
            kind,
            origin: ProviderKind::Places,
            feature: Some(feature),
        }
    }
}

/// Provider vocabulary onto the common feature kinds. Types come as a list;
/// the first recognized entry wins.
fn kind_from_types(types: &[String]) -> FeatureKind {
    types
        .iter()
        .find_map(|raw| kind_from_wire(raw))
        .unwrap_or(FeatureKind::Place)
}

fn kind_from_wire(raw: &str) -> Option<FeatureKind> {
    match raw {
        "point_of_interest" | "establishment" | "airport" | "stadium" | "museum"
        | "tourist_attraction" | "restaurant" | "park" => Some(FeatureKind::Poi),
        "street_address" | "premise" => Some(FeatureKind::Address),
        "route" => Some(FeatureKind::Street),
        "postal_code" => Some(FeatureKind::Postcode),
        "sublocality" | "sublocality_level_1" | "neighborhood" => Some(FeatureKind::Neighborhood),
        "locality" => Some(FeatureKind::Place),
        "administrative_area_level_1" | "administrative_area_level_2" => Some(FeatureKind::Region),
        "country" => Some(FeatureKind::Country),
        _ => None,
    }
}
