//! Camera transition sequencing
//!
//! This example drives the camera sequencer against a logging render surface:
//! - The two-phase globe-to-street transition with a 3D close-up
//! - Bounds fitting for wide features
//! - Generation guards cutting over to a newer flight mid-animation

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use meridian::{
    BoundingBox, BoundsFit, CameraMove, CameraSequencer, Feature, FeatureKind, LngLat, Projection,
    RenderSurface, RenderedGeometry, TransitionRequest,
};

/// Surface that narrates every call and takes 50ms per animation, enough to
/// watch a newer flight overtake an older one.
struct LoggingSurface {
    projection: Mutex<Projection>,
}

impl LoggingSurface {
    fn new() -> Self {
        Self {
            projection: Mutex::new(Projection::Globe),
        }
    }
}

#[async_trait]
impl RenderSurface for LoggingSurface {
    fn projection(&self) -> Projection {
        *self.projection.lock().unwrap()
    }

    fn set_projection(&self, projection: Projection) {
        *self.projection.lock().unwrap() = projection;
        println!("  [surface] projection -> {projection:?}");
    }

    async fn ease_to(&self, movement: &CameraMove) {
        println!(
            "  [surface] ease to ({:.4}, {:.4}) zoom {:.1} pitch {:.0} over {}ms",
            movement.center.lng,
            movement.center.lat,
            movement.zoom,
            movement.pitch,
            movement.duration.as_millis()
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    async fn fit_bounds(&self, fit: &BoundsFit) {
        println!(
            "  [surface] fit bounds (max zoom {:.1}, padding {:.0}px) over {}ms",
            fit.max_zoom,
            fit.padding,
            fit.duration.as_millis()
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn stop_animation(&self) {
        println!("  [surface] stop current animation");
    }

    async fn wait_idle(&self) {
        println!("  [surface] idle, tiles loaded");
    }

    fn query_geometry_near(&self, point: LngLat) -> Vec<RenderedGeometry> {
        vec![RenderedGeometry {
            id: 42,
            centroid: LngLat::new(point.lng + 0.0003, point.lat + 0.0002),
        }]
    }

    fn highlight(&self, geometry: &RenderedGeometry) {
        println!("  [surface] highlight geometry #{}", geometry.id);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let surface = Arc::new(LoggingSurface::new());
    let sequencer = CameraSequencer::new(Some(surface));

    // Two-phase flight from globe altitude down to a pitched close-up.
    println!("Flying to the Eiffel Tower (close-up):");
    let phase = sequencer
        .fly_to(TransitionRequest {
            feature: Feature::new(LngLat::new(2.2945, 48.8584), "Eiffel Tower, Paris, France")
                .with_kind(FeatureKind::Poi),
            closeup: true,
            highlight: true,
        })
        .await;
    println!("  -> {phase:?} (generation {})\n", sequencer.generation());

    // Wide features are fitted, not centered.
    println!("Flying to Hokkaido (bounds fit):");
    let phase = sequencer
        .fly_to(TransitionRequest {
            feature: Feature::new(LngLat::new(142.8, 43.2), "Hokkaido, Japan")
                .with_kind(FeatureKind::Region)
                .with_bbox(BoundingBox::new(139.3, 41.3, 145.8, 45.6)),
            closeup: true,
            highlight: true,
        })
        .await;
    println!("  -> {phase:?} (generation {})\n", sequencer.generation());

    // A newer request takes the generation over mid-animation.
    println!("Starting a flight to Sydney, then cutting over to Tokyo:");
    let older = {
        let sequencer = sequencer.clone();
        tokio::spawn(async move {
            sequencer
                .fly_to(TransitionRequest {
                    feature: Feature::new(
                        LngLat::new(151.2153, -33.8568),
                        "Sydney Opera House, Sydney, Australia",
                    )
                    .with_kind(FeatureKind::Poi),
                    closeup: true,
                    highlight: false,
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let newer = sequencer
        .fly_to(TransitionRequest {
            feature: Feature::new(LngLat::new(139.6917, 35.6895), "Tokyo, Japan")
                .with_kind(FeatureKind::Place),
            closeup: false,
            highlight: false,
        })
        .await;
    println!("  older flight: {:?}", older.await?);
    println!("  newer flight: {newer:?}");
    println!("  final generation: {}", sequencer.generation());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_env() {
        let _ = meridian::init_logging(tracing::Level::WARN);
    }

    #[test]
    fn test_camera_flight_example() {
        setup_test_env();
        assert!(
            main().is_ok(),
            "Camera flight example should run successfully"
        );
    }
}
