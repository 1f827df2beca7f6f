//! Meridian - Location Search and Map Navigation Library
//!
//! Meridian turns free-text location queries into resolved geographic features
//! and cinematic camera transitions. It blends session-scoped suggestions, a
//! forward geocoder, and a commercial place search into one ranked shortlist,
//! then flies a render surface to whatever the user picks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meridian::{Navigator, NavigatorConfigBuilder};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), meridian::error::MeridianError> {
//! let config = NavigatorConfigBuilder::new()
//!     .access_token("pk.your-token-here")
//!     .build();
//! let navigator = Navigator::new(config)?;
//!
//! // Suggestions while the user types
//! navigator.open_session();
//! let shortlist = navigator.update_query("eiffel to").await?;
//! for suggestion in &shortlist {
//!     println!("{} ({})", suggestion.name, suggestion.subtitle);
//! }
//!
//! // Resolve on Enter
//! let feature = navigator.submit("eiffel tower").await?;
//! println!("Resolved: {} at {:?}", feature.display, feature.center);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Blended Suggestions**: Three providers merged, deduplicated, and ranked
//!   behind one debounced call
//! - **Intent-Aware Ranking**: Address-like queries favor streets and POIs,
//!   name-like queries favor cities and regions
//! - **Supersession Everywhere**: Newer keystrokes and submits win regardless
//!   of network completion order
//! - **Cinematic Camera**: Generation-guarded two-phase transitions from globe
//!   to street level, with bounds fitting for wide features
//! - **Session Economics**: Suggest/retrieve calls share one billing session
//!   token for the lifetime of the search interaction
//!
//! # Offline Behavior
//!
//! The landmark and quick-pick tables are compiled in, so merged shortlists
//! are padded without extra network round trips. Embedders without live
//! credentials can swap in their own [`PlaceProvider`] implementations and
//! keep the full suggestion and camera pipeline; any provider failure
//! surfaces as a single user-facing message rather than a panic.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod aggregate;
mod cache;
mod camera;
mod config;
mod coordinator;
pub mod error;
mod intent;
mod landmarks;
mod navigator;
mod rank;

// Re-export the controller most embedders start and stop at
pub use navigator::{Navigator, SearchState};

pub use aggregate::SuggestionAggregator;
pub use cache::{DEFAULT_TTL, TtlCache};
pub use camera::{
    BoundsFit, CameraMove, CameraProfile, CameraSequencer, Projection, RenderSurface,
    RenderedGeometry, TransitionPhase, TransitionRequest, profile_for,
};
pub use config::{DEFAULT_DEBOUNCE, EndpointsBuilder, NavigatorConfig, NavigatorConfigBuilder};
pub use coordinator::{RequestCategory, RequestCoordinator, RequestTicket};
pub use intent::{Intent, classify, normalize_query};
pub use landmarks::{SHORTLIST_CAP, shortlist};
// Re-export the wire layer from the subcrate
pub use meridian_providers as providers;
pub use meridian_providers::{
    BoundingBox, Feature, FeatureKind, LngLat, PlacePayload, PlaceProvider, ProviderConfig,
    ProviderError, ProviderKind, RecordSource, RelatedRecord, RelatedRecords, SessionToken,
    SuggestOptions, Suggestion,
};
pub use rank::{rank, score};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Meridian library.
///
/// This sets up structured logging with configurable levels and filtering.
/// Call this once at the start of your application to enable detailed
/// logging output from Meridian operations.
///
/// # Arguments
///
/// * `level` - The minimum log level to display
///
/// # Examples
///
/// ```rust
/// use meridian::init_logging;
/// use tracing::Level;
///
/// // Initialize with info-level logging
/// init_logging(Level::INFO)?;
/// # Ok::<(), meridian::error::MeridianError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::MeridianError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("reqwest=warn".parse().unwrap())
            .add_directive("hyper_util=warn".parse().unwrap());

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
