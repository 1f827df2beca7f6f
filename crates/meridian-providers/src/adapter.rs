//! The common surface every provider is normalized into.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    Result,
    model::{Feature, Intent, ProviderKind, SessionToken, Suggestion},
};

/// Options threaded through suggest calls.
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    pub intent: Intent,
    /// BCP-47 language tag passed to providers that honor one.
    pub language: String,
    /// Maximum suggestions requested per provider.
    pub limit: usize,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            intent: Intent::Broad,
            language: "en".to_owned(),
            limit: 10,
        }
    }
}

/// One external geocoding/search provider behind a uniform interface.
///
/// Not every provider implements every operation; the default bodies return
/// an empty result so callers can issue calls without capability checks.
///
/// Contract for implementors:
/// - a cancelled call resolves to an empty result, never an error;
/// - transport failures surface as [`ProviderError::Transport`];
/// - key/quota refusals surface as [`ProviderError::Permission`];
/// - nothing provider-specific escapes; responses are mapped into
///   [`Suggestion`]/[`Feature`] before returning.
///
/// [`ProviderError::Transport`]: crate::ProviderError::Transport
/// [`ProviderError::Permission`]: crate::ProviderError::Permission
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Which provider this adapter fronts.
    fn kind(&self) -> ProviderKind;

    /// Live suggestions for a partial query.
    async fn suggest(
        &self,
        query: &str,
        options: &SuggestOptions,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Vec<Suggestion>> {
        let _ = (query, options, session, cancel);
        Ok(Vec::new())
    }

    /// Resolve a previously-suggested entry to a full feature.
    async fn retrieve(
        &self,
        suggestion_id: &str,
        session: &SessionToken,
        cancel: &CancellationToken,
    ) -> Result<Option<Feature>> {
        let _ = (suggestion_id, session, cancel);
        Ok(None)
    }

    /// One-shot text query to a single best feature. `focused` disables
    /// autocomplete fuzzing and restricts matching to poi/address/street.
    async fn search(
        &self,
        query: &str,
        focused: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Feature>> {
        let _ = (query, focused, cancel);
        Ok(None)
    }
}
