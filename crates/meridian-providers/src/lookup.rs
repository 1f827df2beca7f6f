//! Backend related-records lookup (consumed only).
//!
//! After a place resolves, the backend is asked which domain records mention
//! that location. The call is fire-and-forget relative to navigation: its
//! failure or latency never blocks or alters the camera transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    Result,
    http::{ProviderConfig, build_client, read_json, run_cancellable},
    model::{Feature, FeatureKind, LngLat},
};

/// Everything the backend wants to know about a resolved place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacePayload {
    pub name: String,
    /// Full formatted place name ("Shibuya, Tokyo, Japan").
    pub formatted: String,
    pub kinds: Vec<FeatureKind>,
    pub center: LngLat,
    pub region: Option<String>,
    pub country: Option<String>,
    /// Narrow matching to the named place only, no regional spillover.
    pub strict: bool,
}

impl PlacePayload {
    /// Derive the payload from a resolved feature. Display strings follow the
    /// "name, region, country" convention, so trailing segments fill the
    /// region/country fields when present.
    pub fn from_feature(feature: &Feature, strict: bool) -> Self {
        let segments: Vec<&str> = feature.display.split(", ").collect();
        let name = segments.first().map_or_else(String::new, ToString::to_string);
        let (region, country) = match segments.len() {
            0 | 1 => (None, None),
            2 => (None, Some(segments[1].to_owned())),
            n => (Some(segments[n - 2].to_owned()), Some(segments[n - 1].to_owned())),
        };
        Self {
            name,
            formatted: feature.display.clone(),
            kinds: feature.kinds.clone(),
            center: feature.center,
            region,
            country,
            strict,
        }
    }

    /// The single location string the wire accepts.
    pub fn location_string(&self) -> String {
        if self.formatted.is_empty() {
            let mut parts = vec![self.name.clone()];
            parts.extend(self.region.iter().cloned());
            parts.extend(self.country.iter().cloned());
            parts.retain(|part| !part.is_empty());
            parts.join(", ")
        } else {
            self.formatted.clone()
        }
    }
}

/// One domain record mentioning the looked-up location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub question: String,
    #[serde(default)]
    pub category: String,
    /// Which location fields the record matched on.
    #[serde(default)]
    pub matched_on: Vec<String>,
}

/// One page of related records plus paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelatedRecords {
    #[serde(default)]
    pub results: Vec<RelatedRecord>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub has_more: bool,
}

/// Source of related records for a resolved place. Implemented by the HTTP
/// client below and by in-memory fakes in tests.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page of records mentioning the resolved place. Cancellation
    /// yields an empty page, never an error.
    async fn related_records(
        &self,
        place: &PlacePayload,
        limit: usize,
        offset: usize,
        cancel: &CancellationToken,
    ) -> Result<RelatedRecords>;
}

/// Client for the backend place-lookup service.
#[derive(Debug, Clone)]
pub struct LookupClient {
    client: reqwest::Client,
    base: String,
}

impl LookupClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            base: config.lookup_base.clone(),
        })
    }
}

#[async_trait]
impl RecordSource for LookupClient {
    #[instrument(level = "debug", skip(self, place, cancel), fields(location = %place.location_string()))]
    async fn related_records(
        &self,
        place: &PlacePayload,
        limit: usize,
        offset: usize,
        cancel: &CancellationToken,
    ) -> Result<RelatedRecords> {
        let params = [
            ("location", place.location_string()),
            ("strict", place.strict.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let call = async {
            let response = self
                .client
                .get(format!("{}/api/v1/events/by-location", self.base))
                .query(&params)
                .send()
                .await?;
            read_json::<RelatedRecords>(response, "lookup").await
        };
        let Some(outcome) = run_cancellable(cancel, call).await else {
            debug!("lookup cancelled");
            return Ok(RelatedRecords::default());
        };
        let page = outcome?;
        debug!(count = page.count, has_more = page.has_more, "lookup complete");
        Ok(page)
    }
}
