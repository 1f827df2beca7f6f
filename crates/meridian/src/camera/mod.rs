//! Generation-guarded camera transitions.
//!
//! Every navigation request allocates the next generation number and stops
//! whatever the surface is animating. Each animation is awaited, and the
//! guard is re-checked at every resumption point; a transition that lost the
//! generation race backs out without touching the surface again. That check
//! is the sole cancellation mechanism for in-flight animation chains.

pub mod surface;

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use meridian_providers::{Feature, FeatureKind, LngLat};
use tracing::{debug, instrument};

pub use self::surface::{
    BoundsFit, CameraMove, CameraProfile, Projection, RenderSurface, RenderedGeometry, profile_for,
};

/// Zoom offset between a target and its globe-approach altitude. The 3D
/// close-up variant pulls back further for a longer dive.
const APPROACH_OFFSET_CLOSEUP: f64 = 3.0;
const APPROACH_OFFSET: f64 = 1.8;
/// Approach never goes above this, whatever the offset arithmetic says.
const MIN_APPROACH_ZOOM: f64 = 2.4;

const APPROACH_DURATION: Duration = Duration::from_millis(1200);
const CLOSEUP_DURATION: Duration = Duration::from_millis(2600);
const FLY_DURATION: Duration = Duration::from_millis(1800);
const FIT_DURATION: Duration = Duration::from_millis(1600);
const EASE_BACK_DURATION: Duration = Duration::from_millis(800);

const FIT_PADDING: f64 = 64.0;
const FIT_MAX_ZOOM: f64 = 10.5;

/// Where a transition currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Idle,
    /// Diving from globe altitude toward the target.
    Approaching,
    /// Final center/zoom move on the flat map.
    Finalizing,
    /// Final bounds fit on the flat map.
    Bounding,
    Done,
    Superseded,
}

/// One navigation request.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub feature: Feature,
    /// Ask for the pitched 3D close-up where the place type supports one.
    pub closeup: bool,
    /// Highlight rendered geometry near the target once settled.
    pub highlight: bool,
}

/// Drives multi-phase camera transitions against the render surface.
#[derive(Clone)]
pub struct CameraSequencer {
    surface: Option<Arc<dyn RenderSurface>>,
    generation: Arc<AtomicU64>,
    phase: Arc<Mutex<TransitionPhase>>,
}

impl CameraSequencer {
    /// Without a surface every transition is a silent no-op.
    pub fn new(surface: Option<Arc<dyn RenderSurface>>) -> Self {
        Self {
            surface,
            generation: Arc::new(AtomicU64::new(0)),
            phase: Arc::new(Mutex::new(TransitionPhase::Idle)),
        }
    }

    /// Generation of the most recent transition; strictly increasing.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Phase of the current-generation transition.
    pub fn phase(&self) -> TransitionPhase {
        *self.lock_phase()
    }

    /// Run one transition to completion. Returns `Done`, or `Superseded` if a
    /// newer request took over mid-flight, or `Idle` when no surface is
    /// attached.
    #[instrument(level = "debug", skip_all, fields(place = %request.feature.display))]
    pub async fn fly_to(&self, request: TransitionRequest) -> TransitionPhase {
        let Some(surface) = self.surface.clone() else {
            debug!("no render surface attached, skipping transition");
            return TransitionPhase::Idle;
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        surface.stop_animation();

        let kind = request.feature.primary_kind();
        let profile = profile_for(kind);
        let center = request.feature.center;
        let closeup = request.closeup && profile.pitch > 0.0;
        let bounding =
            request.feature.bbox.is_some() && !kind.is_some_and(FeatureKind::is_small_area);
        debug!(generation, ?kind, closeup, bounding, "transition start");

        // Phase 1: dive from orbit when starting on the globe.
        if surface.projection() == Projection::Globe {
            self.set_phase(generation, TransitionPhase::Approaching);
            let offset = if closeup {
                APPROACH_OFFSET_CLOSEUP
            } else {
                APPROACH_OFFSET
            };
            let approach = CameraMove {
                center,
                zoom: (profile.zoom - offset).max(MIN_APPROACH_ZOOM),
                pitch: 0.0,
                bearing: 0.0,
                duration: APPROACH_DURATION,
            };
            surface.ease_to(&approach).await;
            if !self.is_current(generation) {
                return TransitionPhase::Superseded;
            }
        }

        // Phase 2: final move on the flat map.
        if surface.projection() != Projection::Flat {
            surface.set_projection(Projection::Flat);
        }
        let final_pitch = if closeup { profile.pitch } else { 0.0 };
        if bounding {
            self.set_phase(generation, TransitionPhase::Bounding);
            if let Some(bbox) = request.feature.bbox {
                let fit = BoundsFit {
                    bbox,
                    padding: FIT_PADDING,
                    max_zoom: FIT_MAX_ZOOM,
                    duration: FIT_DURATION,
                };
                surface.fit_bounds(&fit).await;
            }
        } else {
            self.set_phase(generation, TransitionPhase::Finalizing);
            let movement = CameraMove {
                center,
                zoom: profile.zoom,
                pitch: final_pitch,
                bearing: if closeup { profile.bearing } else { 0.0 },
                duration: if closeup { CLOSEUP_DURATION } else { FLY_DURATION },
            };
            surface.ease_to(&movement).await;
        }
        if !self.is_current(generation) {
            return TransitionPhase::Superseded;
        }

        if request.highlight && !bounding {
            surface.wait_idle().await;
            if !self.is_current(generation) {
                return TransitionPhase::Superseded;
            }
            let nearby = surface.query_geometry_near(center);
            if let Some(target) = nearest_centroid(&nearby, center) {
                surface.highlight(target);
            } else if final_pitch > 0.0 {
                // Nothing to pin the close-up on: settle back to a flat view.
                let settle = CameraMove {
                    center,
                    zoom: profile.zoom,
                    pitch: 0.0,
                    bearing: 0.0,
                    duration: EASE_BACK_DURATION,
                };
                surface.ease_to(&settle).await;
                if !self.is_current(generation) {
                    return TransitionPhase::Superseded;
                }
            }
        }

        self.set_phase(generation, TransitionPhase::Done);
        debug!(generation, "transition complete");
        TransitionPhase::Done
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Record the phase, unless a newer generation owns the slot already.
    fn set_phase(&self, generation: u64, phase: TransitionPhase) {
        if self.is_current(generation) {
            *self.lock_phase() = phase;
        }
    }

    fn lock_phase(&self) -> MutexGuard<'_, TransitionPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn nearest_centroid(geometries: &[RenderedGeometry], point: LngLat) -> Option<&RenderedGeometry> {
    geometries.iter().min_by(|a, b| {
        distance_sq(a.centroid, point).total_cmp(&distance_sq(b.centroid, point))
    })
}

fn distance_sq(a: LngLat, b: LngLat) -> f64 {
    let dlng = a.lng - b.lng;
    let dlat = a.lat - b.lat;
    dlng.mul_add(dlng, dlat * dlat)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use meridian_providers::BoundingBox;
    use tokio::sync::Semaphore;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Stop,
        SetProjection(Projection),
        Ease(CameraMove),
        Fit(BoundsFit),
        WaitIdle,
        Highlight(u64),
    }

    struct FakeSurface {
        projection: StdMutex<Projection>,
        calls: StdMutex<Vec<Call>>,
        gate: Option<Arc<Semaphore>>,
        geometry: Vec<RenderedGeometry>,
    }

    impl FakeSurface {
        fn starting_in(projection: Projection) -> Self {
            Self {
                projection: StdMutex::new(projection),
                calls: StdMutex::new(Vec::new()),
                gate: None,
                geometry: Vec::new(),
            }
        }

        fn gated(projection: Projection, gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::starting_in(projection)
            }
        }

        fn with_geometry(mut self, geometry: Vec<RenderedGeometry>) -> Self {
            self.geometry = geometry;
            self
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn pass_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
        }
    }

    #[async_trait::async_trait]
    impl RenderSurface for FakeSurface {
        fn projection(&self) -> Projection {
            *self.projection.lock().unwrap()
        }

        fn set_projection(&self, projection: Projection) {
            *self.projection.lock().unwrap() = projection;
            self.record(Call::SetProjection(projection));
        }

        async fn ease_to(&self, movement: &CameraMove) {
            self.record(Call::Ease(movement.clone()));
            self.pass_gate().await;
        }

        async fn fit_bounds(&self, fit: &BoundsFit) {
            self.record(Call::Fit(fit.clone()));
            self.pass_gate().await;
        }

        fn stop_animation(&self) {
            self.record(Call::Stop);
        }

        async fn wait_idle(&self) {
            self.record(Call::WaitIdle);
        }

        fn query_geometry_near(&self, _point: LngLat) -> Vec<RenderedGeometry> {
            self.geometry.clone()
        }

        fn highlight(&self, geometry: &RenderedGeometry) {
            self.record(Call::Highlight(geometry.id));
        }
    }

    fn poi_feature() -> Feature {
        Feature::new(LngLat::new(2.2945, 48.8584), "Eiffel Tower, Paris, France")
            .with_kind(FeatureKind::Poi)
    }

    fn city_feature() -> Feature {
        Feature::new(LngLat::new(139.6917, 35.6895), "Tokyo, Japan")
            .with_kind(FeatureKind::Place)
            .with_bbox(BoundingBox::new(138.9, 35.5, 139.9, 35.9))
    }

    fn request(feature: Feature, closeup: bool, highlight: bool) -> TransitionRequest {
        TransitionRequest {
            feature,
            closeup,
            highlight,
        }
    }

    fn eases(calls: &[Call]) -> Vec<CameraMove> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Ease(movement) => Some(movement.clone()),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn closeup_from_globe_runs_two_phases() {
        let surface = Arc::new(FakeSurface::starting_in(Projection::Globe));
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        let phase = sequencer.fly_to(request(poi_feature(), true, false)).await;
        assert_eq!(phase, TransitionPhase::Done);
        assert_eq!(sequencer.generation(), 1);

        let calls = surface.calls();
        assert_eq!(calls[0], Call::Stop);
        let moves = eases(&calls);
        assert_eq!(moves.len(), 2);
        // Approach pulls back by the close-up offset and stays flat.
        assert!((moves[0].zoom - (15.2 - 3.0)).abs() < f64::EPSILON);
        assert!(moves[0].pitch.abs() < f64::EPSILON);
        // Final move carries the full close-up profile.
        assert!((moves[1].zoom - 15.2).abs() < f64::EPSILON);
        assert!((moves[1].pitch - 60.0).abs() < f64::EPSILON);
        assert!((moves[1].bearing - 20.0).abs() < f64::EPSILON);
        assert_eq!(moves[1].duration, CLOSEUP_DURATION);
        assert!(calls.contains(&Call::SetProjection(Projection::Flat)));
    }

    #[tokio::test]
    async fn flat_start_skips_the_approach() {
        let surface = Arc::new(FakeSurface::starting_in(Projection::Flat));
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        sequencer.fly_to(request(poi_feature(), false, false)).await;

        let moves = eases(&surface.calls());
        assert_eq!(moves.len(), 1);
        // No close-up requested: pitch and bearing forced flat, shorter move.
        assert!(moves[0].pitch.abs() < f64::EPSILON);
        assert!(moves[0].bearing.abs() < f64::EPSILON);
        assert_eq!(moves[0].duration, FLY_DURATION);
    }

    #[tokio::test]
    async fn wide_features_fit_bounds_instead_of_centering() {
        let surface = Arc::new(FakeSurface::starting_in(Projection::Globe));
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        let phase = sequencer.fly_to(request(city_feature(), true, false)).await;
        assert_eq!(phase, TransitionPhase::Done);

        let calls = surface.calls();
        let fit = calls
            .iter()
            .find_map(|call| match call {
                Call::Fit(fit) => Some(fit.clone()),
                _ => None,
            })
            .expect("bounds fit issued");
        assert!((fit.padding - FIT_PADDING).abs() < f64::EPSILON);
        assert!((fit.max_zoom - FIT_MAX_ZOOM).abs() < f64::EPSILON);
        // The approach still ran, but no final center/zoom ease did.
        assert_eq!(eases(&calls).len(), 1);
    }

    #[tokio::test]
    async fn small_area_features_center_even_with_a_bbox() {
        let feature = Feature::new(LngLat::new(-73.9857, 40.7484), "Empire State Building")
            .with_kind(FeatureKind::Poi)
            .with_bbox(BoundingBox::new(-73.987, 40.747, -73.984, 40.75));
        let surface = Arc::new(FakeSurface::starting_in(Projection::Flat));
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        sequencer.fly_to(request(feature, false, false)).await;

        let calls = surface.calls();
        assert!(calls.iter().all(|call| !matches!(call, Call::Fit(_))));
        assert_eq!(eases(&calls).len(), 1);
    }

    #[tokio::test]
    async fn missing_surface_is_a_silent_noop() {
        let sequencer = CameraSequencer::new(None);
        let phase = sequencer.fly_to(request(poi_feature(), true, true)).await;
        assert_eq!(phase, TransitionPhase::Idle);
        assert_eq!(sequencer.generation(), 0);
    }

    #[tokio::test]
    async fn generations_increase_across_transitions() {
        let surface = Arc::new(FakeSurface::starting_in(Projection::Flat));
        let sequencer = CameraSequencer::new(Some(surface));
        for expected in 1..=3 {
            let phase = sequencer.fly_to(request(poi_feature(), false, false)).await;
            assert_eq!(phase, TransitionPhase::Done);
            assert_eq!(sequencer.generation(), expected);
        }
    }

    #[tokio::test]
    async fn newer_transition_supersedes_the_older_one() {
        let gate = Arc::new(Semaphore::new(0));
        let surface = Arc::new(FakeSurface::gated(Projection::Globe, gate.clone()));
        let sequencer = CameraSequencer::new(Some(surface.clone()));

        let first = {
            let sequencer = sequencer.clone();
            tokio::spawn(
                async move { sequencer.fly_to(request(poi_feature(), true, false)).await },
            )
        };
        settle().await;
        let second = {
            let sequencer = sequencer.clone();
            tokio::spawn(
                async move { sequencer.fly_to(request(poi_feature(), true, false)).await },
            )
        };
        settle().await;
        gate.add_permits(8);

        assert_eq!(first.await.unwrap(), TransitionPhase::Superseded);
        assert_eq!(second.await.unwrap(), TransitionPhase::Done);
        assert_eq!(sequencer.generation(), 2);
        assert_eq!(sequencer.phase(), TransitionPhase::Done);
        // Each request stopped whatever was animating when it arrived.
        let stops = surface
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Stop))
            .count();
        assert_eq!(stops, 2);
    }

    #[tokio::test]
    async fn highlight_picks_the_nearest_geometry() {
        let near = RenderedGeometry {
            id: 7,
            centroid: LngLat::new(2.2946, 48.8585),
        };
        let far = RenderedGeometry {
            id: 9,
            centroid: LngLat::new(2.30, 48.86),
        };
        let surface = Arc::new(
            FakeSurface::starting_in(Projection::Flat).with_geometry(vec![far, near]),
        );
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        sequencer.fly_to(request(poi_feature(), true, true)).await;

        let calls = surface.calls();
        assert!(calls.contains(&Call::WaitIdle));
        assert!(calls.contains(&Call::Highlight(7)));
    }

    #[tokio::test]
    async fn highlight_without_geometry_settles_flat() {
        let surface = Arc::new(FakeSurface::starting_in(Projection::Flat));
        let sequencer = CameraSequencer::new(Some(surface.clone()));
        let phase = sequencer.fly_to(request(poi_feature(), true, true)).await;
        assert_eq!(phase, TransitionPhase::Done);

        let moves = eases(&surface.calls());
        let last = moves.last().unwrap();
        assert!(last.pitch.abs() < f64::EPSILON);
        assert_eq!(last.duration, EASE_BACK_DURATION);
    }
}
