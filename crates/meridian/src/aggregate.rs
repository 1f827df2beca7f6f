//! Multi-provider suggestion aggregation.
//!
//! One combine call fans out to the primary path for the query's intent plus
//! the commercial provider, waits for both, then merges. Provider latency
//! never influences the final order: merging happens only after both legs
//! complete.

use std::sync::Arc;

use ahash::AHashSet;
use meridian_providers::{
    Intent, PlaceProvider, SessionToken, SuggestOptions, Suggestion,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{error::Result, intent::normalize_query};

/// Drop later entries that share a (lowercased name, lowercased subtitle)
/// key with an earlier one.
pub(crate) fn dedup_keep_first(suggestions: &mut Vec<Suggestion>) {
    let mut seen = AHashSet::new();
    suggestions.retain(|suggestion| seen.insert(suggestion.dedup_key()));
}

/// Fans suggestion queries out to the providers and merges the results.
#[derive(Clone)]
pub struct SuggestionAggregator {
    searchbox: Arc<dyn PlaceProvider>,
    geocoder: Arc<dyn PlaceProvider>,
    places: Arc<dyn PlaceProvider>,
}

impl SuggestionAggregator {
    pub fn new(
        searchbox: Arc<dyn PlaceProvider>,
        geocoder: Arc<dyn PlaceProvider>,
        places: Arc<dyn PlaceProvider>,
    ) -> Self {
        Self {
            searchbox,
            geocoder,
            places,
        }
    }

    /// Gather suggestions from the primary path for this intent plus the
    /// commercial provider, running both in parallel.
    ///
    /// Primary path: `Specific` queries hit the focused geocoder first and
    /// fall back to the session suggest call when it yields nothing; `Broad`
    /// queries hit the broad geocoder. Merge order: commercial results first
    /// for `Specific` or multi-token queries, primary results first
    /// otherwise. Duplicates keep the first-seen entry.
    ///
    /// # Errors
    ///
    /// Transport and permission failures from either leg propagate typed;
    /// cancellation surfaces as an empty list, never an error.
    #[instrument(level = "debug", skip(self, options, session, cancel), fields(intent = ?options.intent))]
    pub async fn combine(
        &self,
        query: &str,
        options: &SuggestOptions,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        let commercial_leg = self.places.suggest(query, options, session, cancel);
        let primary_leg = self.primary(query, options, session, cancel);
        let (commercial, primary) = tokio::join!(commercial_leg, primary_leg);
        let commercial = commercial?;
        let primary = primary?;
        debug!(
            commercial = commercial.len(),
            primary = primary.len(),
            "provider legs complete"
        );

        let commercial_first = options.intent == Intent::Specific || is_multi_token(query);
        let mut merged = if commercial_first {
            let mut list = commercial;
            list.extend(primary);
            list
        } else {
            let mut list = primary;
            list.extend(commercial);
            list
        };
        dedup_keep_first(&mut merged);
        Ok(merged)
    }

    async fn primary(
        &self,
        query: &str,
        options: &SuggestOptions,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        match options.intent {
            Intent::Specific => {
                let focused = self.geocoder.suggest(query, options, session, cancel).await?;
                if !focused.is_empty() || cancel.is_cancelled() {
                    return Ok(focused);
                }
                debug!("focused path empty, falling back to session suggest");
                Ok(self.searchbox.suggest(query, options, session, cancel).await?)
            }
            Intent::Broad => Ok(self.geocoder.suggest(query, options, session, cancel).await?),
        }
    }
}

fn is_multi_token(query: &str) -> bool {
    normalize_query(query).split_whitespace().count() >= 2
}
