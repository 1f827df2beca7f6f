//! External-interface layer for the meridian workspace.
//!
//! Everything that talks to the outside world lives here: the common
//! [`Suggestion`]/[`Feature`] model, the [`PlaceProvider`] adapter trait, one
//! HTTP client per provider, and the backend related-records lookup. The core
//! crate orchestrates these through the trait and never sees a wire shape.

pub mod adapter;
mod error;
pub mod geocode;
pub mod http;
pub mod lookup;
pub mod model;
pub mod places;
pub mod searchbox;

pub use adapter::{PlaceProvider, SuggestOptions};
pub use error::{ProviderError, Result};
pub use geocode::GeocodeClient;
pub use http::{DEFAULT_REQUEST_TIMEOUT, ProviderConfig};
pub use lookup::{LookupClient, PlacePayload, RecordSource, RelatedRecord, RelatedRecords};
pub use model::{
    BoundingBox, Feature, FeatureKind, Intent, LngLat, ProviderKind, SessionToken, Suggestion,
};
pub use places::PlacesClient;
pub use searchbox::SearchBoxClient;
