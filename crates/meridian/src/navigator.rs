//! The navigator: one instance-scoped controller per map view.
//!
//! Owns everything the pipeline used to scatter across the session: the
//! request coordinator, the session token, the three TTL caches, and the
//! visible search state. All methods take `&self`; interior state sits behind
//! a std `Mutex` that is locked only for synchronous bookkeeping, never
//! across an await point. Correctness under concurrent calls rests on the
//! coordinator's sequence checks at every commit point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use meridian_providers::{
    Feature, GeocodeClient, Intent, LookupClient, PlacePayload, PlaceProvider, PlacesClient,
    ProviderError, ProviderKind, RecordSource, RelatedRecords, SearchBoxClient, SessionToken,
    SuggestOptions, Suggestion,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    aggregate::SuggestionAggregator,
    cache::TtlCache,
    camera::{CameraSequencer, RenderSurface, TransitionRequest},
    config::NavigatorConfig,
    coordinator::{RequestCategory, RequestCoordinator, RequestTicket},
    error::{MeridianError, Result},
    intent::{classify, normalize_query},
    landmarks::shortlist,
    rank::rank,
};

/// Snapshot of what a UI bound to the navigator should be showing.
/// Serializable so UI bindings can ship it across a process or FFI boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    /// Ranked, capped suggestion shortlist for the current query.
    pub shortlist: Vec<Suggestion>,
    /// Whether a suggest or resolve request is in flight.
    pub loading: bool,
    /// The one user-facing failure message, if the last request failed.
    pub error: Option<String>,
    /// Records related to the most recently resolved place.
    pub records: Option<RelatedRecords>,
}

struct NavigatorState {
    coordinator: RequestCoordinator,
    session: Option<SessionToken>,
    suggestion_cache: TtlCache<String, Vec<Suggestion>>,
    feature_cache: TtlCache<String, Feature>,
    retrieve_cache: TtlCache<String, Feature>,
    view: SearchState,
}

impl NavigatorState {
    fn new(ttl: std::time::Duration) -> Self {
        Self {
            coordinator: RequestCoordinator::new(),
            session: None,
            suggestion_cache: TtlCache::new(ttl),
            feature_cache: TtlCache::new(ttl),
            retrieve_cache: TtlCache::new(ttl),
            view: SearchState::default(),
        }
    }
}

fn lock_state(inner: &Mutex<NavigatorState>) -> MutexGuard<'_, NavigatorState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Location search and navigation controller for one map view.
///
/// Construct one per view with [`Navigator::new`] (headless) or
/// [`Navigator::with_surface`] (camera transitions enabled), feed it
/// keystrokes via [`update_query`](Self::update_query), and resolve with
/// [`submit`](Self::submit) or [`commit`](Self::commit). The visible state
/// is read back through [`state`](Self::state).
pub struct Navigator {
    config: NavigatorConfig,
    aggregator: SuggestionAggregator,
    searchbox: Arc<dyn PlaceProvider>,
    geocoder: Arc<dyn PlaceProvider>,
    lookup: Arc<dyn RecordSource>,
    camera: CameraSequencer,
    inner: Arc<Mutex<NavigatorState>>,
}

impl Navigator {
    /// Build a navigator without a render surface; resolutions still work,
    /// camera transitions become silent no-ops.
    ///
    /// # Errors
    ///
    /// Fails if an underlying HTTP client cannot be constructed.
    pub fn new(config: NavigatorConfig) -> Result<Self> {
        Self::from_config(config, None)
    }

    /// Build a navigator driving camera transitions on `surface`.
    ///
    /// # Errors
    ///
    /// Fails if an underlying HTTP client cannot be constructed.
    pub fn with_surface(config: NavigatorConfig, surface: Arc<dyn RenderSurface>) -> Result<Self> {
        Self::from_config(config, Some(surface))
    }

    /// Wire a navigator from pre-built parts. Meant for tests and embedders
    /// that bring their own provider implementations.
    pub fn with_providers(
        config: NavigatorConfig,
        searchbox: Arc<dyn PlaceProvider>,
        geocoder: Arc<dyn PlaceProvider>,
        places: Arc<dyn PlaceProvider>,
        lookup: Arc<dyn RecordSource>,
        surface: Option<Arc<dyn RenderSurface>>,
    ) -> Self {
        let aggregator = SuggestionAggregator::new(
            Arc::clone(&searchbox),
            Arc::clone(&geocoder),
            places,
        );
        let inner = Arc::new(Mutex::new(NavigatorState::new(config.cache_ttl)));
        Self {
            aggregator,
            searchbox,
            geocoder,
            lookup,
            camera: CameraSequencer::new(surface),
            inner,
            config,
        }
    }

    fn from_config(
        config: NavigatorConfig,
        surface: Option<Arc<dyn RenderSurface>>,
    ) -> Result<Self> {
        let searchbox: Arc<dyn PlaceProvider> = Arc::new(SearchBoxClient::new(&config.provider)?);
        let geocoder: Arc<dyn PlaceProvider> = Arc::new(GeocodeClient::new(&config.provider)?);
        let places: Arc<dyn PlaceProvider> = Arc::new(PlacesClient::new(&config.provider)?);
        let lookup: Arc<dyn RecordSource> = Arc::new(LookupClient::new(&config.provider)?);
        Ok(Self::with_providers(
            config, searchbox, geocoder, places, lookup, surface,
        ))
    }

    /// The camera sequencer this navigator drives.
    pub fn camera(&self) -> &CameraSequencer {
        &self.camera
    }

    /// Snapshot of the visible search state.
    pub fn state(&self) -> SearchState {
        self.lock().view.clone()
    }

    /// Start a suggestion session. Provider calls issued until the session
    /// closes share one session token. Idempotent; `update_query` opens a
    /// session lazily if none is active.
    pub fn open_session(&self) {
        let mut state = self.lock();
        if state.session.is_none() {
            state.session = Some(SessionToken::new());
            debug!("session opened");
        }
    }

    /// Tear the session down: cancel both request lanes, drop the session
    /// token, and reset visible state. Caches survive, they are TTL-bounded.
    pub fn close_session(&self) {
        let mut state = self.lock();
        state.coordinator.cancel_all();
        state.session = None;
        state.view = SearchState::default();
        debug!("session closed");
    }

    /// Feed the current contents of the search box. Debounces, queries the
    /// providers, ranks, and commits the shortlist unless a newer call
    /// superseded this one mid-flight.
    ///
    /// Returns the shortlist now showing, or an empty list when this call
    /// was superseded (its result is discarded without touching state).
    ///
    /// # Errors
    ///
    /// Provider transport/permission failures propagate after the one
    /// user-facing message has been recorded in [`SearchState::error`].
    #[instrument(level = "debug", skip(self), fields(query = %text))]
    pub async fn update_query(&self, text: &str) -> Result<Vec<Suggestion>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            let mut state = self.lock();
            // Supersede any in-flight fetch so it cannot repopulate the list.
            let _ = state.coordinator.begin(RequestCategory::Suggest);
            state.view.shortlist.clear();
            state.view.loading = false;
            state.view.error = None;
            return Ok(Vec::new());
        }

        let (ticket, session) = {
            let mut state = self.lock();
            let ticket = state.coordinator.begin(RequestCategory::Suggest);
            let session = state.session.get_or_insert_with(SessionToken::new).clone();
            state.view.loading = true;
            state.view.error = None;
            (ticket, session)
        };

        if !ticket.debounce(self.config.debounce).await {
            debug!(seq = ticket.seq, "superseded while debouncing");
            return Ok(Vec::new());
        }

        let intent = classify(trimmed);
        let normalized = normalize_query(trimmed);

        let cached = self.lock().suggestion_cache.get(&normalized);
        if let Some(merged) = cached {
            debug!("suggestion cache hit");
            return Ok(self.commit_shortlist(&ticket, trimmed, intent, merged));
        }

        let options = SuggestOptions {
            intent,
            language: self.config.language.clone(),
            limit: self.config.suggest_limit,
        };
        let merged = match self
            .aggregator
            .combine(trimmed, &options, &session, &ticket.cancel)
            .await
        {
            Ok(merged) => merged,
            Err(error) => return Err(self.fail(&ticket, error)),
        };

        {
            let mut state = self.lock();
            if !state.coordinator.is_current(&ticket) {
                debug!(seq = ticket.seq, "suggestion result superseded, dropping");
                return Ok(Vec::new());
            }
            // Cache the merged list pre-ranking; a cancelled fetch never gets
            // here, so an empty-on-cancel result cannot poison the cache.
            state.suggestion_cache.insert(normalized, merged.clone());
        }
        Ok(self.commit_shortlist(&ticket, trimmed, intent, merged))
    }

    /// Resolve free text to a single feature, fly the camera there, and kick
    /// off the related-records lookup.
    ///
    /// # Errors
    ///
    /// [`MeridianError::NoResult`] when nothing matches; provider failures
    /// propagate after the user-facing message has been recorded. A call
    /// superseded mid-flight surfaces as a cancelled provider error and
    /// leaves visible state untouched.
    #[instrument(level = "debug", skip(self), fields(query = %text))]
    pub async fn submit(&self, text: &str) -> Result<Feature> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MeridianError::NoResult(text.to_owned()));
        }
        let (ticket, session) = self.begin_resolve();
        let intent = classify(trimmed);
        let normalized = normalize_query(trimmed);

        let cached = self.lock().feature_cache.get(&normalized);
        if let Some(feature) = cached {
            debug!("feature cache hit");
            return self.commit_resolution(&ticket, Some(normalized), feature, intent);
        }

        let focused = intent == Intent::Specific;
        let found = match self.geocoder.search(trimmed, focused, &ticket.cancel).await {
            Ok(found) => found,
            Err(error) => return Err(self.fail(&ticket, error.into())),
        };
        let found = match found {
            Some(found) => Some(found),
            None => match self
                .suggest_retrieve_fallback(trimmed, intent, &session, &ticket)
                .await
            {
                Ok(found) => found,
                Err(error) => return Err(self.fail(&ticket, error.into())),
            },
        };

        match found {
            Some(feature) => self.commit_resolution(&ticket, Some(normalized), feature, intent),
            None if self.is_current(&ticket) => {
                Err(self.fail(&ticket, MeridianError::NoResult(trimmed.to_owned())))
            }
            None => Err(MeridianError::Provider(ProviderError::Cancelled)),
        }
    }

    /// Resolve a suggestion the user picked from the shortlist.
    ///
    /// Embedded features commit without any network round trip; session
    /// suggestions resolve through retrieve-by-id (cached); everything else
    /// falls back to a one-shot search on the suggestion's name.
    ///
    /// # Errors
    ///
    /// Same contract as [`submit`](Self::submit).
    #[instrument(level = "debug", skip(self, suggestion), fields(name = %suggestion.name))]
    pub async fn commit(&self, suggestion: &Suggestion) -> Result<Feature> {
        let (ticket, session) = self.begin_resolve();
        let intent = classify(&suggestion.name);
        let key = normalize_query(&suggestion.name);

        if let Some(feature) = suggestion.feature.clone() {
            return self.commit_resolution(&ticket, Some(key), feature, intent);
        }

        if suggestion.origin == ProviderKind::SearchBox {
            match self.retrieve_feature(suggestion, &session, &ticket).await {
                Ok(Some(feature)) => {
                    return self.commit_resolution(&ticket, Some(key), feature, intent);
                }
                Ok(None) => debug!(id = %suggestion.id, "retrieve returned nothing"),
                Err(error) => return Err(self.fail(&ticket, error.into())),
            }
        }

        let focused = intent == Intent::Specific;
        match self
            .geocoder
            .search(&suggestion.name, focused, &ticket.cancel)
            .await
        {
            Ok(Some(feature)) => self.commit_resolution(&ticket, Some(key), feature, intent),
            Ok(None) if self.is_current(&ticket) => {
                Err(self.fail(&ticket, MeridianError::NoResult(suggestion.name.clone())))
            }
            Ok(None) => Err(MeridianError::Provider(ProviderError::Cancelled)),
            Err(error) => Err(self.fail(&ticket, error.into())),
        }
    }

    /// Session suggest-then-retrieve, for queries the stateless geocoder
    /// cannot resolve.
    async fn suggest_retrieve_fallback(
        &self,
        query: &str,
        intent: Intent,
        session: &SessionToken,
        ticket: &RequestTicket,
    ) -> meridian_providers::Result<Option<Feature>> {
        if ticket.cancel.is_cancelled() {
            return Ok(None);
        }
        debug!("stateless search empty, trying session suggest");
        let options = SuggestOptions {
            intent,
            language: self.config.language.clone(),
            limit: self.config.suggest_limit,
        };
        let suggestions = self
            .searchbox
            .suggest(query, &options, session, &ticket.cancel)
            .await?;
        let Some(first) = suggestions.into_iter().next() else {
            return Ok(None);
        };
        self.retrieve_feature(&first, session, ticket).await
    }

    async fn retrieve_feature(
        &self,
        suggestion: &Suggestion,
        session: &SessionToken,
        ticket: &RequestTicket,
    ) -> meridian_providers::Result<Option<Feature>> {
        let cached = self.lock().retrieve_cache.get(&suggestion.id);
        if let Some(feature) = cached {
            debug!(id = %suggestion.id, "retrieve cache hit");
            return Ok(Some(feature));
        }
        let retrieved = self
            .searchbox
            .retrieve(&suggestion.id, session, &ticket.cancel)
            .await?;
        if let Some(feature) = &retrieved {
            // Keyed by provider id, so validity does not depend on which
            // request fetched it.
            self.lock()
                .retrieve_cache
                .insert(suggestion.id.clone(), feature.clone());
        }
        Ok(retrieved)
    }

    fn begin_resolve(&self) -> (RequestTicket, SessionToken) {
        let mut state = self.lock();
        let ticket = state.coordinator.begin(RequestCategory::Resolve);
        let session = state.session.get_or_insert_with(SessionToken::new).clone();
        state.view.loading = true;
        state.view.error = None;
        state.view.records = None;
        (ticket, session)
    }

    /// Rank, merge with the curated shortlist, and publish, unless the
    /// ticket lost its lane in the meantime.
    fn commit_shortlist(
        &self,
        ticket: &RequestTicket,
        query: &str,
        intent: Intent,
        merged: Vec<Suggestion>,
    ) -> Vec<Suggestion> {
        let ranked = rank(merged, query, intent);
        let list = shortlist(query, ranked, self.config.shortlist_cap);
        let mut state = self.lock();
        if !state.coordinator.is_current(ticket) {
            debug!(seq = ticket.seq, "shortlist superseded, dropping");
            return Vec::new();
        }
        state.view.loading = false;
        state.view.error = None;
        state.view.shortlist = list.clone();
        debug!(entries = list.len(), "shortlist committed");
        list
    }

    /// Publish a resolved feature: cache it, clear loading, then detach the
    /// camera transition and the related-records lookup.
    fn commit_resolution(
        &self,
        ticket: &RequestTicket,
        key: Option<String>,
        feature: Feature,
        intent: Intent,
    ) -> Result<Feature> {
        {
            let mut state = self.lock();
            if !state.coordinator.is_current(ticket) {
                debug!(seq = ticket.seq, "resolution superseded, dropping");
                return Err(MeridianError::Provider(ProviderError::Cancelled));
            }
            if let Some(key) = key {
                state.feature_cache.insert(key, feature.clone());
            }
            state.view.loading = false;
            state.view.error = None;
        }
        info!(place = %feature.display, "location resolved");
        self.start_transition(&feature);
        self.start_record_lookup(&feature, intent, ticket);
        Ok(feature)
    }

    /// Fire-and-forget camera flight. Supersession is the sequencer's
    /// business, not ours.
    fn start_transition(&self, feature: &Feature) {
        let camera = self.camera.clone();
        let request = TransitionRequest {
            feature: feature.clone(),
            closeup: self.config.closeups,
            highlight: self.config.highlight,
        };
        tokio::spawn(async move {
            camera.fly_to(request).await;
        });
    }

    /// Fire-and-forget related-records fetch. Never blocks or alters the
    /// camera transition; a stale page is dropped by the sequence check.
    fn start_record_lookup(&self, feature: &Feature, intent: Intent, ticket: &RequestTicket) {
        let lookup = Arc::clone(&self.lookup);
        let inner = Arc::clone(&self.inner);
        let payload = PlacePayload::from_feature(feature, intent == Intent::Specific);
        let limit = self.config.lookup_page_size;
        let cancel = ticket.cancel.clone();
        let seq = ticket.seq;
        tokio::spawn(async move {
            match lookup.related_records(&payload, limit, 0, &cancel).await {
                Ok(records) => {
                    let mut state = lock_state(&inner);
                    if state.coordinator.current_seq(RequestCategory::Resolve) == seq {
                        state.view.records = Some(records);
                    } else {
                        debug!(seq, "stale record page dropped");
                    }
                }
                Err(error) => debug!(%error, "related-record lookup failed"),
            }
        });
    }

    /// Record the failure in visible state (if this ticket still owns its
    /// lane) and hand the error back for the caller to propagate.
    fn fail(&self, ticket: &RequestTicket, error: MeridianError) -> MeridianError {
        let mut state = self.lock();
        if state.coordinator.is_current(ticket) {
            state.view.loading = false;
            state.view.error = Some(error.user_message());
        }
        warn!(%error, "request failed");
        error
    }

    fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.lock().coordinator.is_current(ticket)
    }

    fn lock(&self) -> MutexGuard<'_, NavigatorState> {
        lock_state(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use meridian_providers::{FeatureKind, LngLat, RelatedRecord};
    use tokio::sync::Semaphore;
    use tokio_util::sync::CancellationToken;

    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(140);

    #[derive(Default)]
    struct FakeProvider {
        suggestions: StdMutex<HashMap<String, Vec<Suggestion>>>,
        searches: StdMutex<HashMap<String, Feature>>,
        retrieves: StdMutex<HashMap<String, Feature>>,
        deny: bool,
        gate: Option<Arc<Semaphore>>,
        suggest_calls: AtomicUsize,
        search_calls: AtomicUsize,
        retrieve_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self::default()
        }

        fn with_suggestions(self, query: &str, list: Vec<Suggestion>) -> Self {
            self.suggestions.lock().unwrap().insert(query.to_owned(), list);
            self
        }

        fn with_search(self, query: &str, feature: Feature) -> Self {
            self.searches.lock().unwrap().insert(query.to_owned(), feature);
            self
        }

        fn with_retrieve(self, id: &str, feature: Feature) -> Self {
            self.retrieves.lock().unwrap().insert(id.to_owned(), feature);
            self
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn denying(mut self) -> Self {
            self.deny = true;
            self
        }

        async fn pass_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
        }
    }

    #[async_trait::async_trait]
    impl PlaceProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Geocoder
        }

        async fn suggest(
            &self,
            query: &str,
            _options: &SuggestOptions,
            _session: &SessionToken,
            cancel: &CancellationToken,
        ) -> meridian_providers::Result<Vec<Suggestion>> {
            self.suggest_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            if self.deny {
                return Err(ProviderError::Permission(
                    "commercial search is disabled for this session".to_owned(),
                ));
            }
            if cancel.is_cancelled() {
                return Ok(Vec::new());
            }
            Ok(self
                .suggestions
                .lock()
                .unwrap()
                .get(query)
                .cloned()
                .unwrap_or_default())
        }

        async fn retrieve(
            &self,
            suggestion_id: &str,
            _session: &SessionToken,
            cancel: &CancellationToken,
        ) -> meridian_providers::Result<Option<Feature>> {
            self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            if cancel.is_cancelled() {
                return Ok(None);
            }
            Ok(self.retrieves.lock().unwrap().get(suggestion_id).cloned())
        }

        async fn search(
            &self,
            query: &str,
            _focused: bool,
            cancel: &CancellationToken,
        ) -> meridian_providers::Result<Option<Feature>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await;
            if cancel.is_cancelled() {
                return Ok(None);
            }
            Ok(self.searches.lock().unwrap().get(query).cloned())
        }
    }

    #[derive(Default)]
    struct FakeRecords {
        by_name: StdMutex<HashMap<String, RelatedRecords>>,
        gate: Option<Arc<Semaphore>>,
        calls: AtomicUsize,
    }

    impl FakeRecords {
        fn with_page(self, name: &str, page: RelatedRecords) -> Self {
            self.by_name.lock().unwrap().insert(name.to_owned(), page);
            self
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait::async_trait]
    impl RecordSource for FakeRecords {
        async fn related_records(
            &self,
            place: &PlacePayload,
            _limit: usize,
            _offset: usize,
            cancel: &CancellationToken,
        ) -> meridian_providers::Result<RelatedRecords> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if cancel.is_cancelled() {
                return Ok(RelatedRecords::default());
            }
            Ok(self
                .by_name
                .lock()
                .unwrap()
                .get(&place.name)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn build(
        searchbox: &Arc<FakeProvider>,
        geocoder: &Arc<FakeProvider>,
        records: &Arc<FakeRecords>,
    ) -> Navigator {
        Navigator::with_providers(
            NavigatorConfig::default(),
            Arc::clone(searchbox) as Arc<dyn PlaceProvider>,
            Arc::clone(geocoder) as Arc<dyn PlaceProvider>,
            Arc::new(FakeProvider::new()),
            Arc::clone(records) as Arc<dyn RecordSource>,
            None,
        )
    }

    fn suggestion(name: &str, subtitle: &str, kind: FeatureKind) -> Suggestion {
        Suggestion {
            id: format!("geo.{}", name.to_lowercase().replace(' ', "-")),
            name: name.to_owned(),
            subtitle: subtitle.to_owned(),
            kind,
            origin: ProviderKind::Geocoder,
            feature: None,
        }
    }

    fn feature(lng: f64, lat: f64, display: &str, kind: FeatureKind) -> Feature {
        Feature::new(LngLat::new(lng, lat), display).with_kind(kind)
    }

    fn page(question: &str, count: usize) -> RelatedRecords {
        RelatedRecords {
            results: vec![RelatedRecord {
                question: question.to_owned(),
                category: "geography".to_owned(),
                matched_on: vec!["name".to_owned()],
            }],
            count,
            has_more: false,
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn empty_query_clears_visible_state() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let list = nav.update_query("   ").await.unwrap();
        assert!(list.is_empty());
        let state = nav.state();
        assert!(state.shortlist.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(geocoder.suggest_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn update_query_commits_a_ranked_shortlist() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().with_suggestions(
            "tokyo",
            vec![
                suggestion("Tokyo Tower", "Tokyo, Japan", FeatureKind::Poi),
                suggestion("Tokyo", "Japan", FeatureKind::Place),
            ],
        ));
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let list = nav.update_query("tokyo").await.unwrap();
        // Broad intent ranks the place above the poi despite arrival order.
        assert_eq!(list[0].name, "Tokyo");
        let state = nav.state();
        assert_eq!(state.shortlist, list);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_queries_hit_the_suggestion_cache() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().with_suggestions(
            "berlin",
            vec![suggestion("Berlin", "Germany", FeatureKind::Place)],
        ));
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let first = nav.update_query("berlin").await.unwrap();
        let second = nav.update_query("berlin").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(geocoder.suggest_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newest_query_wins_regardless_of_completion_order() {
        let gate = Arc::new(Semaphore::new(0));
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(
            FakeProvider::new()
                .with_suggestions(
                    "lon",
                    vec![suggestion("Lonsdale", "Australia", FeatureKind::Place)],
                )
                .with_suggestions(
                    "london",
                    vec![suggestion("London", "United Kingdom", FeatureKind::Place)],
                )
                .gated(Arc::clone(&gate)),
        );
        let records = Arc::new(FakeRecords::default());
        let nav = Arc::new(build(&searchbox, &geocoder, &records));

        let first = {
            let nav = Arc::clone(&nav);
            tokio::spawn(async move { nav.update_query("lon").await })
        };
        settle().await;
        tokio::time::advance(DEBOUNCE).await;
        settle().await;

        let second = {
            let nav = Arc::clone(&nav);
            tokio::spawn(async move { nav.update_query("london").await })
        };
        settle().await;
        tokio::time::advance(DEBOUNCE).await;
        settle().await;
        gate.add_permits(16);

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert!(first.is_empty());
        assert_eq!(second[0].name, "London");
        assert_eq!(nav.state().shortlist[0].name, "London");
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_surfaces_one_message() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().denying());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let error = nav.update_query("berlin").await.unwrap_err();
        assert!(!error.is_cancelled());
        let state = nav.state();
        assert_eq!(
            state.error.as_deref(),
            Some("commercial search is disabled for this session")
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn submit_resolves_and_records_arrive() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().with_search(
            "tokyo",
            feature(139.6917, 35.6895, "Tokyo, Japan", FeatureKind::Place),
        ));
        let records = Arc::new(
            FakeRecords::default().with_page("Tokyo", page("Will it snow in Tokyo?", 2)),
        );
        let nav = build(&searchbox, &geocoder, &records);

        let resolved = nav.submit("tokyo").await.unwrap();
        assert_eq!(resolved.display, "Tokyo, Japan");
        let state = nav.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);

        settle().await;
        let state = nav.state();
        assert_eq!(state.records.as_ref().map(|r| r.count), Some(2));
    }

    #[tokio::test]
    async fn submit_falls_back_to_session_retrieve() {
        let target = feature(-73.9857, 40.7484, "350 5th Ave, New York", FeatureKind::Address);
        let searchbox = Arc::new(
            FakeProvider::new()
                .with_suggestions(
                    "350 5th Ave",
                    vec![Suggestion {
                        id: "sb.350".to_owned(),
                        name: "350 5th Ave".to_owned(),
                        subtitle: "New York".to_owned(),
                        kind: FeatureKind::Address,
                        origin: ProviderKind::SearchBox,
                        feature: None,
                    }],
                )
                .with_retrieve("sb.350", target.clone()),
        );
        let geocoder = Arc::new(FakeProvider::new());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let resolved = nav.submit("350 5th Ave").await.unwrap();
        assert_eq!(resolved, target);
        assert_eq!(geocoder.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(searchbox.suggest_calls.load(Ordering::SeqCst), 1);
        assert_eq!(searchbox.retrieve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submit_without_a_match_reports_no_result() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let error = nav.submit("xyzzy").await.unwrap_err();
        assert!(matches!(error, MeridianError::NoResult(_)));
        let state = nav.state();
        assert_eq!(
            state.error.as_deref(),
            Some("No location found. Try a more specific search.")
        );
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn commit_prefers_the_embedded_feature() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let embedded = feature(2.2945, 48.8584, "Eiffel Tower, Paris, France", FeatureKind::Poi);
        let picked = Suggestion {
            id: "places.eiffel".to_owned(),
            name: "Eiffel Tower".to_owned(),
            subtitle: "Paris, France".to_owned(),
            kind: FeatureKind::Poi,
            origin: ProviderKind::Places,
            feature: Some(embedded.clone()),
        };
        let resolved = nav.commit(&picked).await.unwrap();
        assert_eq!(resolved, embedded);
        assert_eq!(geocoder.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(searchbox.retrieve_calls.load(Ordering::SeqCst), 0);
        assert!(!nav.state().loading);
    }

    #[tokio::test]
    async fn commit_retrieves_session_suggestions_by_id_once() {
        let target = feature(-0.1246, 51.5007, "Big Ben, London", FeatureKind::Poi);
        let searchbox = Arc::new(FakeProvider::new().with_retrieve("sb.big-ben", target.clone()));
        let geocoder = Arc::new(FakeProvider::new());
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        let picked = Suggestion {
            id: "sb.big-ben".to_owned(),
            name: "Big Ben".to_owned(),
            subtitle: "London, United Kingdom".to_owned(),
            kind: FeatureKind::Poi,
            origin: ProviderKind::SearchBox,
            feature: None,
        };
        let first = nav.commit(&picked).await.unwrap();
        let second = nav.commit(&picked).await.unwrap();
        assert_eq!(first, target);
        assert_eq!(second, target);
        assert_eq!(searchbox.retrieve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_record_pages_never_land() {
        let gate = Arc::new(Semaphore::new(0));
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(
            FakeProvider::new()
                .with_search(
                    "tokyo",
                    feature(139.6917, 35.6895, "Tokyo, Japan", FeatureKind::Place),
                )
                .with_search(
                    "paris",
                    feature(2.3522, 48.8566, "Paris, France", FeatureKind::Place),
                ),
        );
        let records = Arc::new(
            FakeRecords::default()
                .with_page("Tokyo", page("Will it snow in Tokyo?", 1))
                .with_page("Paris", page("Will the Seine flood?", 2))
                .gated(Arc::clone(&gate)),
        );
        let nav = build(&searchbox, &geocoder, &records);

        nav.submit("tokyo").await.unwrap();
        settle().await;
        nav.submit("paris").await.unwrap();
        settle().await;
        gate.add_permits(4);
        settle().await;

        let state = nav.state();
        assert_eq!(state.records.as_ref().map(|r| r.count), Some(2));
        assert_eq!(records.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_session_resets_and_a_new_one_works() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().with_suggestions(
            "berlin",
            vec![suggestion("Berlin", "Germany", FeatureKind::Place)],
        ));
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        nav.open_session();
        let list = nav.update_query("berlin").await.unwrap();
        assert!(!list.is_empty());

        nav.close_session();
        assert_eq!(nav.state(), SearchState::default());

        let list = nav.update_query("berlin").await.unwrap();
        assert_eq!(list[0].name, "Berlin");
    }

    #[tokio::test(start_paused = true)]
    async fn search_state_serializes_for_ui_bindings() {
        let searchbox = Arc::new(FakeProvider::new());
        let geocoder = Arc::new(FakeProvider::new().with_suggestions(
            "oslo",
            vec![suggestion("Oslo", "Norway", FeatureKind::Place)],
        ));
        let records = Arc::new(FakeRecords::default());
        let nav = build(&searchbox, &geocoder, &records);

        nav.update_query("oslo").await.unwrap();

        let value = serde_json::to_value(nav.state()).unwrap();
        assert_eq!(value["loading"], false);
        assert_eq!(value["error"], serde_json::Value::Null);
        assert_eq!(value["shortlist"][0]["name"], "Oslo");
        assert_eq!(value["shortlist"][0]["origin"], "geocoder");
    }
}
