//! Stateless forward-geocode client.
//!
//! Serves two roles: one-shot [`PlaceProvider::search`] resolution (with a
//! `focused` variant that disables autocomplete fuzzing and restricts types),
//! and the broad suggest path, where the returned feature list doubles as
//! suggestions with geometry already embedded.

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

/// Focused searches only ever resolve exact targets.
const FOCUSED_TYPES: &[&str] = &["poi", "address", "street"];
const BROAD_TYPES: &[&str] = &["place", "locality", "district", "region", "country"];

/// Client for the stateless forward-geocode provider.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: reqwest::Client,
    base: String,
    token: String,
}

impl GeocodeClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            base: config.geocode_base.clone(),
            token: config.access_token.clone(),
        })
    }

    fn forward_params(
        &self,
        query: &str,
        language: &str,
        limit: usize,
        autocomplete: bool,
        types: &[&str],
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.to_owned()),
            ("access_token", self.token.clone()),
            ("language", language.to_owned()),
            ("limit", limit.to_string()),
            ("autocomplete", autocomplete.to_string()),
        ];
        if !types.is_empty() {
            params.push(("types", types.join(",")));
        }
        params
    }

    async fn forward(
        &self,
        query: &str,
        language: &str,
        limit: usize,
        autocomplete: bool,
        types: &[&str],
    ) -> Result<Vec<WireFeature>> {
        let params = self.forward_params(query, language, limit, autocomplete, types);
        let response = self
            .client
            .get(format!("{}/forward", self.base))
            .query(&params)
            .send()
            .await?;
        let body: ForwardResponse = read_json(response, "geocode").await?;
        Ok(body.features)
    }
}

#[async_trait]
impl PlaceProvider for GeocodeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Geocoder
    }

    /// Broad suggest path: each geocoded feature becomes a suggestion with
    /// its geometry embedded, so committing one needs no retrieve call.
    #[instrument(level = "debug", skip(self, options, _session, cancel))]
    async fn suggest(
        &self,
        query: &str,
        options: &SuggestOptions,
        _session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        let types = match options.intent {
            Intent::Specific => FOCUSED_TYPES,
            Intent::Broad => BROAD_TYPES,
        };
        let call = self.forward(query, &options.language, options.limit, true, types);
        let Some(outcome) = run_cancellable(cancel, call).await else {
            debug!("suggest cancelled");
            return Ok(Vec::new());
        };
        let suggestions: Vec<Suggestion> = outcome?
            .into_iter()
            .map(WireFeature::into_suggestion)
            .collect();
        debug!(count = suggestions.len(), "geocode suggest complete");
        Ok(suggestions)
    }

    #[instrument(level = "debug", skip(self, cancel))]
    async fn search(
        &self,
        query: &str,
        focused: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Feature>> {
        let types: &[&str] = if focused { FOCUSED_TYPES } else { &[] };
        let call = self.forward(query, "en", 1, !focused, types);
        let Some(outcome) = run_cancellable(cancel, call).await else {
            debug!("search cancelled");
            return Ok(None);
        };
        Ok(outcome?.into_iter().next().map(WireFeature::into_feature))
    }
}

/// Provider vocabulary onto the common feature kinds.
fn kind_from_wire(raw: &str) -> FeatureKind {
    match raw {
        "poi" => FeatureKind::Poi,
        "address" | "secondary_address" | "block" => FeatureKind::Address,
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
struct ForwardResponse {
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
    mapbox_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    feature_type: String,
    #[serde(default)]
    place_formatted: String,
    #[serde(default)]
    full_address: Option<String>,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

impl WireFeature {
    fn into_feature(self) -> Feature {
        let [lng, lat] = self.geometry.coordinates;
        let display = match &self.properties.full_address {
            Some(address) if !address.is_empty() => address.clone(),
            _ if !self.properties.place_formatted.is_empty() => {
                format!("{}, {}", self.properties.name, self.properties.place_formatted)
            }
            _ => self.properties.name.clone(),
        };
        let mut feature = Feature::new(LngLat::new(lng, lat), display)
            .with_kind(kind_from_wire(&self.properties.feature_type));
        if let Some([min_lng, min_lat, max_lng, max_lat]) = self.properties.bbox {
            feature = feature.with_bbox(BoundingBox::new(min_lng, min_lat, max_lng, max_lat));
        }
        feature
    }

    fn into_suggestion(self) -> Suggestion {
        let id = self.properties.mapbox_id.clone();
        let name = self.properties.name.clone();
        let subtitle = self.properties.place_formatted.clone();
        let kind = kind_from_wire(&self.properties.feature_type);
        Suggestion {
            id,
            name,
            subtitle,
            kind,
            origin: ProviderKind::Geocoder,
            feature: Some(self.into_feature()),
        }
    }
}
