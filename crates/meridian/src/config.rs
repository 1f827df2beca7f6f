//! Navigator configuration with ergonomic builder defaults.

use std::time::Duration;

use meridian_providers::ProviderConfig;

use crate::{cache::DEFAULT_TTL, landmarks::SHORTLIST_CAP};

/// Keystroke settle window before a suggestion request is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(140);
const DEFAULT_SUGGEST_LIMIT: usize = 10;
const DEFAULT_LOOKUP_PAGE_SIZE: usize = 25;

/// Tunable behavior of a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// How long a query must stay unchanged before providers are queried.
    pub debounce: Duration,
    /// Lifetime of cached suggestion and resolution results.
    pub cache_ttl: Duration,
    /// Per-provider suggestion limit.
    pub suggest_limit: usize,
    /// Maximum entries in the instant curated shortlist.
    pub shortlist_cap: usize,
    /// BCP-47 language tag forwarded to providers.
    pub language: String,
    /// Allow pitched 3D close-up transitions for small-area targets.
    pub closeups: bool,
    /// Highlight rendered geometry once a close-up settles.
    pub highlight: bool,
    /// Page size for related-record lookups after a resolution.
    pub lookup_page_size: usize,
    /// Endpoints, credentials and HTTP behavior of the provider clients.
    pub provider: ProviderConfig,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            cache_ttl: DEFAULT_TTL,
            suggest_limit: DEFAULT_SUGGEST_LIMIT,
            shortlist_cap: SHORTLIST_CAP,
            language: "en".to_owned(),
            closeups: true,
            highlight: true,
            lookup_page_size: DEFAULT_LOOKUP_PAGE_SIZE,
            provider: ProviderConfig::default(),
        }
    }
}

impl NavigatorConfig {
    pub fn builder() -> NavigatorConfigBuilder {
        NavigatorConfigBuilder::new()
    }
}

/// Builder for creating navigator configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct NavigatorConfigBuilder {
    config: NavigatorConfig,
}

impl NavigatorConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: NavigatorConfig::default(),
        }
    }

    /// Create a builder optimized for light network use (fewer suggestions,
    /// longer settle window, no cinematic close-ups)
    pub fn fast() -> Self {
        let mut builder = Self::new();
        builder.config.debounce = Duration::from_millis(200);
        builder.config.suggest_limit = 5;
        builder.config.closeups = false;
        builder.config.highlight = false;
        builder
    }

    /// Create a builder optimized for responsiveness and visual detail
    pub fn comprehensive() -> Self {
        let mut builder = Self::new();
        builder.config.debounce = Duration::from_millis(100);
        builder.config.suggest_limit = DEFAULT_SUGGEST_LIMIT;
        builder.config.closeups = true;
        builder.config.highlight = true;
        builder
    }

    /// Set the keystroke settle window
    pub fn debounce(mut self, window: Duration) -> Self {
        self.config.debounce = window;
        self
    }

    /// Set the result cache lifetime
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Set the per-provider suggestion limit (Search Box caps suggest at 10)
    pub fn suggest_limit(mut self, limit: usize) -> Self {
        self.config.suggest_limit = limit.clamp(1, 10);
        self
    }

    /// Set the curated shortlist cap
    pub fn shortlist_cap(mut self, cap: usize) -> Self {
        self.config.shortlist_cap = cap.max(1);
        self
    }

    /// Set the language tag forwarded to providers
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Enable or disable pitched 3D close-up transitions
    pub fn closeups(mut self, enabled: bool) -> Self {
        self.config.closeups = enabled;
        self
    }

    /// Enable or disable geometry highlighting after close-ups
    pub fn highlight(mut self, enabled: bool) -> Self {
        self.config.highlight = enabled;
        self
    }

    /// Set the related-record page size
    pub fn lookup_page_size(mut self, size: usize) -> Self {
        self.config.lookup_page_size = size.max(1);
        self
    }

    /// Set the Mapbox access token used by both Mapbox providers
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.provider.access_token = token.into();
        self
    }

    /// Set the Google Places API key
    pub fn places_key(mut self, key: impl Into<String>) -> Self {
        self.config.provider.places_key = key.into();
        self
    }

    /// Set the per-request HTTP timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider.request_timeout = timeout;
        self
    }

    /// Configure provider endpoint bases
    pub fn endpoints(self) -> EndpointsBuilder {
        EndpointsBuilder::new(self)
    }

    /// Build the final configuration
    pub fn build(self) -> NavigatorConfig {
        self.config
    }
}

/// Builder for provider endpoint bases, mainly useful for tests and proxies
pub struct EndpointsBuilder {
    parent: NavigatorConfigBuilder,
}

impl EndpointsBuilder {
    fn new(parent: NavigatorConfigBuilder) -> Self {
        Self { parent }
    }

    /// Override the Search Box API base URL
    pub fn searchbox(mut self, base: impl Into<String>) -> Self {
        self.parent.config.provider.searchbox_base = base.into();
        self
    }

    /// Override the forward-geocoding API base URL
    pub fn geocode(mut self, base: impl Into<String>) -> Self {
        self.parent.config.provider.geocode_base = base.into();
        self
    }

    /// Override the commercial place-search API base URL
    pub fn places(mut self, base: impl Into<String>) -> Self {
        self.parent.config.provider.places_base = base.into();
        self
    }

    /// Override the related-records service base URL
    pub fn lookup(mut self, base: impl Into<String>) -> Self {
        self.parent.config.provider.lookup_base = base.into();
        self
    }

    /// Return to the main configuration builder
    pub fn done(self) -> NavigatorConfigBuilder {
        self.parent
    }
}
