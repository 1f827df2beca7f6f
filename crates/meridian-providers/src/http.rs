//! Shared HTTP plumbing for the provider clients.

use std::{future::Future, time::Duration};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::{ProviderError, Result};

/// Default per-request deadline. Providers give no latency guarantees, and an
/// unresponsive one must not stall its request category until the user types
/// again, so every call is bounded.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Connection settings shared by the provider clients.
///
/// Base URLs default to the live services; tests point them at local fakes.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Session-scoped suggest/retrieve endpoint root.
    pub searchbox_base: String,
    /// Stateless forward-geocode endpoint root.
    pub geocode_base: String,
    /// Commercial text-search endpoint root.
    pub places_base: String,
    /// Backend related-records service root.
    pub lookup_base: String,
    /// Access token appended to searchbox/geocode calls.
    pub access_token: String,
    /// API key sent as a header on commercial text-search calls.
    pub places_key: String,
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            searchbox_base: "https://api.mapbox.com/search/searchbox/v1".to_owned(),
            geocode_base: "https://api.mapbox.com/search/geocode/v6".to_owned(),
            places_base: "https://places.googleapis.com/v1".to_owned(),
            lookup_base: "http://127.0.0.1:8000".to_owned(),
            access_token: String::new(),
            places_key: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::Transport(format!("client construction: {err}")))
}

/// Run a provider call unless the token fires first. Returns `None` on
/// cancellation so callers can map it to the contract's empty result.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Map a provider response to our error taxonomy and decode its JSON body.
///
/// 401/403/429 are key or quota refusals; everything else non-2xx is a
/// transport failure, as is a body that fails to decode.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    provider: &str,
) -> Result<T> {
    let status = response.status();
    if matches!(status.as_u16(), 401 | 403 | 429) {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Permission(format!(
            "{provider} returned {status}: {}",
            snippet(&body)
        )));
    }
    if !status.is_success() {
        return Err(ProviderError::Transport(format!(
            "{provider} returned {status}"
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| ProviderError::Transport(format!("{provider} response decode: {err}")))
}

fn snippet(body: &str) -> String {
    body.chars().take(160).collect()
}
