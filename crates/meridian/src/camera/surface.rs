//! The render-surface capability the sequencer drives.
//!
//! The core never renders anything. It switches projection, runs animated
//! camera moves, fits bounds and queries rendered geometry through this
//! trait; the embedding map client implements it.

use std::time::Duration;

use async_trait::async_trait;
use meridian_providers::{BoundingBox, FeatureKind, LngLat};

/// Map projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Overview globe, the state new map views start in.
    Globe,
    /// Flat map used for everything below approach altitude.
    Flat,
}

/// One animated camera move.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMove {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub duration: Duration,
}

/// One animated bounds fit.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsFit {
    pub bbox: BoundingBox,
    /// Screen-edge padding in pixels.
    pub padding: f64,
    /// The fit never zooms in past this.
    pub max_zoom: f64,
    pub duration: Duration,
}

/// A piece of rendered geometry near a queried point.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedGeometry {
    pub id: u64,
    pub centroid: LngLat,
}

/// Rendering capability consumed by the camera sequencer.
///
/// Animated operations resolve when the surface reports the animation
/// complete; a stopped animation resolves early. Implementations use interior
/// mutability, the sequencer only ever holds a shared reference.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    fn projection(&self) -> Projection;

    fn set_projection(&self, projection: Projection);

    /// Animate to a camera position; resolves on animation completion.
    async fn ease_to(&self, movement: &CameraMove);

    /// Animate the viewport to contain a bounding box.
    async fn fit_bounds(&self, fit: &BoundsFit);

    /// Stop whatever animation is currently running.
    fn stop_animation(&self);

    /// Resolves once the surface reports idle (tiles loaded, nothing
    /// animating).
    async fn wait_idle(&self);

    /// Rendered geometry near a point, nearest first not guaranteed.
    fn query_geometry_near(&self, point: LngLat) -> Vec<RenderedGeometry>;

    /// Mark one piece of geometry highlighted.
    fn highlight(&self, geometry: &RenderedGeometry);
}

/// Camera parameters derived from a feature's place type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProfile {
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// Fixed place-type lookup for transition targets.
pub fn profile_for(kind: Option<FeatureKind>) -> CameraProfile {
    match kind {
        Some(FeatureKind::Address | FeatureKind::Poi | FeatureKind::Street) => CameraProfile {
            zoom: 15.2,
            pitch: 60.0,
            bearing: 20.0,
        },
        Some(
            FeatureKind::District | FeatureKind::Neighborhood | FeatureKind::Postcode,
        ) => CameraProfile {
            zoom: 14.8,
            pitch: 58.0,
            bearing: 20.0,
        },
        Some(FeatureKind::Place | FeatureKind::Locality) => CameraProfile {
            zoom: 10.2,
            pitch: 0.0,
            bearing: 0.0,
        },
        Some(FeatureKind::Region) => CameraProfile {
            zoom: 6.7,
            pitch: 0.0,
            bearing: 0.0,
        },
        Some(FeatureKind::Country) => CameraProfile {
            zoom: 4.8,
            pitch: 0.0,
            bearing: 0.0,
        },
        None => CameraProfile {
            zoom: 12.0,
            pitch: 0.0,
            bearing: 0.0,
        },
    }
}
