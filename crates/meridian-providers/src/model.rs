//! Common result shapes shared by every provider adapter.
//!
//! Provider responses come in as loosely-typed, provider-specific JSON; each
//! adapter maps them into this closed set of types at the boundary so that
//! nothing provider-specific leaks into the rest of the pipeline.

use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Axis-aligned bounding box (`min_lng, min_lat, max_lng, max_lat`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Closed set of feature categories every provider vocabulary maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Place,
    Locality,
    District,
    Neighborhood,
    Region,
    Country,
    Poi,
    Address,
    Street,
    Postcode,
}

impl FeatureKind {
    /// Small-area kinds get the center/zoom camera flow even when a bounding
    /// box is present; larger areas get fit-bounds instead.
    pub const fn is_small_area(self) -> bool {
        matches!(
            self,
            Self::Address | Self::Poi | Self::District | Self::Neighborhood | Self::Postcode
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Locality => "locality",
            Self::District => "district",
            Self::Neighborhood => "neighborhood",
            Self::Region => "region",
            Self::Country => "country",
            Self::Poi => "poi",
            Self::Address => "address",
            Self::Street => "street",
            Self::Postcode => "postcode",
        }
    }
}

/// Coarse query classification that biases provider type filters.
///
/// `Broad` queries look like place or region names; `Specific` queries look
/// like street addresses or points of interest. The classifier lives in the
/// core crate; adapters only consume the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    Broad,
    Specific,
}

/// Which adapter produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Session-scoped suggest/retrieve provider.
    SearchBox,
    /// Stateless forward-geocode provider.
    Geocoder,
    /// Commercial text-search provider.
    Places,
    /// Built-in landmark and quick-pick tables, no network involved.
    Static,
}

/// A resolved geographic feature: a point, optionally an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub center: LngLat,
    pub bbox: Option<BoundingBox>,
    /// Place-type tags, most specific first.
    pub kinds: Vec<FeatureKind>,
    /// Human-readable label ("Eiffel Tower, Paris, France").
    pub display: String,
}

impl Feature {
    pub fn new(center: LngLat, display: impl Into<String>) -> Self {
        Self {
            center,
            bbox: None,
            kinds: Vec::new(),
            display: display.into(),
        }
    }

    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn primary_kind(&self) -> Option<FeatureKind> {
        self.kinds.first().copied()
    }
}

/// A candidate result shown while the user types.
///
/// May or may not carry an embedded [`Feature`]; providers that return full
/// geometry inline populate it so that committing the suggestion needs no
/// further network round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Provider-scoped identifier, used for retrieve-by-id calls.
    pub id: String,
    pub name: String,
    /// Formatted locality/country line shown under the name.
    pub subtitle: String,
    pub kind: FeatureKind,
    pub origin: ProviderKind,
    pub feature: Option<Feature>,
}

impl Suggestion {
    /// Key under which duplicate suggestions are collapsed; the first-seen
    /// entry for a key always wins.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.to_lowercase(), self.subtitle.to_lowercase())
    }
}

/// Opaque token scoping a run of session-aware provider calls to one user
/// search interaction. Created when the suggestion UI opens, discarded when
/// it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}
