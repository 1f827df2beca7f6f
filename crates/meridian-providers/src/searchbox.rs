//! Session-scoped suggest/retrieve client.
//!
//! Suggestions from this provider carry no geometry; the UI shows them as-is
//! and a follow-up [`PlaceProvider::retrieve`] within the same session
//! resolves the chosen entry into a full [`Feature`].

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    Result,
    adapter::{PlaceProvider, SuggestOptions},
    http::{ProviderConfig, build_client, read_json, run_cancellable},
    model::{
        BoundingBox, Feature, FeatureKind, Intent, LngLat, ProviderKind, SessionToken, Suggestion,
    },
};

/// Type filters sent with suggest calls, most-wanted kinds first.
const SPECIFIC_TYPES: &[&str] = &["poi", "address", "street", "place"];
const BROAD_TYPES: &[&str] = &["place", "locality", "district", "region", "country", "poi"];

/// Client for the session-scoped suggest/retrieve provider.
#[derive(Debug, Clone)]
pub struct SearchBoxClient {
    client: reqwest::Client,
    base: String,
    token: String,
}

impl SearchBoxClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            base: config.searchbox_base.clone(),
            token: config.access_token.clone(),
        })
    }

    fn type_filter(intent: Intent) -> &'static [&'static str] {
        match intent {
            Intent::Specific => SPECIFIC_TYPES,
            Intent::Broad => BROAD_TYPES,
        }
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
        options: &SuggestOptions,
        session: &SessionToken,
    ) -> Result<Vec<Suggestion>> {
        let params = [
            ("q", query.to_owned()),
            ("access_token", self.token.clone()),
            ("session_token", session.as_str().to_owned()),
            ("language", options.language.clone()),
            ("limit", options.limit.to_string()),
            ("types", Self::type_filter(options.intent).join(",")),
        ];
        let response = self
            .client
            .get(format!("{}/suggest", self.base))
            .query(&params)
            .send()
            .await?;
        let body: SuggestResponse = read_json(response, "searchbox").await?;
        Ok(body
            .suggestions
            .into_iter()
            .map(WireSuggestion::into_suggestion)
            .collect())
    }

    async fn fetch_feature(
        &self,
        suggestion_id: &str,
        session: &SessionToken,
    ) -> Result<Option<Feature>> {
        let params = [
            ("access_token", self.token.clone()),
            ("session_token", session.as_str().to_owned()),
        ];
        let response = self
            .client
            .get(format!("{}/retrieve/{suggestion_id}", self.base))
            .query(&params)
            .send()
            .await?;
        let body: RetrieveResponse = read_json(response, "searchbox").await?;
        Ok(body.features.into_iter().next().map(WireFeature::into_feature))
    }
}

#[async_trait]
impl PlaceProvider for SearchBoxClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SearchBox
    }

    #[instrument(level = "debug", skip(self, options, session, cancel))]
    async fn suggest(
        &self,
        query: &str,
        options: &SuggestOptions,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        let suggest = self.fetch_suggestions(query, options, session);
        let Some(outcome) = run_cancellable(cancel, suggest).await else {
            debug!("suggest cancelled");
            return Ok(Vec::new());
        };
        let suggestions = outcome?;
        debug!(count = suggestions.len(), "session suggest complete");
        Ok(suggestions)
    }

    #[instrument(level = "debug", skip(self, session, cancel))]
    async fn retrieve(
        &self,
        suggestion_id: &str,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Option<Feature>> {
        let retrieve = self.fetch_feature(suggestion_id, session);
        let Some(outcome) = run_cancellable(cancel, retrieve).await else {
            debug!("retrieve cancelled");
            return Ok(None);
        };
        outcome
    }
}

/// Provider vocabulary onto the common feature kinds.
fn kind_from_wire(raw: &str) -> FeatureKind {
    match raw {
        "poi" | "category" => FeatureKind::Poi,
        "address" => FeatureKind::Address,
        "street" => FeatureKind::Street,
        "postcode" => FeatureKind::Postcode,
        "neighborhood" => FeatureKind::Neighborhood,
        "district" => FeatureKind::District,
        "locality" => FeatureKind::Locality,
        "region" => FeatureKind::Region,
        "country" => FeatureKind::Country,
        _ => FeatureKind::Place,
    }
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    suggestions: Vec<WireSuggestion>,
}

#[derive(Debug, Deserialize)]
struct WireSuggestion {
    name: String,
    mapbox_id: String,
    #[serde(default)]
    feature_type: String,
    #[serde(default)]
    place_formatted: String,
    #[serde(default)]
    full_address: Option<String>,
}

impl WireSuggestion {
    fn into_suggestion(self) -> Suggestion {
        let subtitle = self.full_address.unwrap_or(self.place_formatted);
        Suggestion {
            id: self.mapbox_id,
            name: self.name,
            subtitle,
            kind: kind_from_wire(&self.feature_type),
            origin: ProviderKind::SearchBox,
            feature: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    features: Vec<WireFeature>,
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    geometry: WireGeometry,
    properties: WireProperties,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct WireProperties {
    #[serde(default)]
    name: String,
    #[serde(default)]
    feature_type: String,
    #[serde(default)]
    full_address: Option<String>,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

impl WireFeature {
    fn into_feature(self) -> Feature {
        let [lng, lat] = self.geometry.coordinates;
        let display = match self.properties.full_address {
            Some(address) if !address.is_empty() => address,
            _ => self.properties.name.clone(),
        };
        let kind = kind_from_wire(&self.properties.feature_type);
        let mut feature = Feature::new(LngLat::new(lng, lat), display).with_kind(kind);
        if let Some([min_lng, min_lat, max_lng, max_lat]) = self.properties.bbox {
            feature = feature.with_bbox(BoundingBox::new(min_lng, min_lat, max_lng, max_lat));
        }
        feature
    }
}
