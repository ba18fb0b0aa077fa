//! # Tour Session
//!
//! The explicit application context for one tour-viewing session. The source
//! app shared this state through ambient global stores; here it is a single
//! object the embedding code owns and passes to whatever needs it.
//!
//! A session holds the sorted spot list, the route builder and its cache, a
//! shared walk simulator, and the proximity detector with its session-scoped
//! shown set. Lifetimes:
//! - the route is derived per waypoint set and cached; changing the spots
//!   yields a new cache key and a rebuild
//! - simulation state lives from start to stop/completion/reset
//! - the proximity shown set lives until [`TourSession::reset`] (leaving the
//!   screen)

use std::sync::{Arc, Mutex};

use crate::geo_utils::CameraPosition;
use crate::proximity::ProximityDetector;
use crate::route_builder::{DirectionsProvider, RouteBuilder};
use crate::runner::SimulationRunner;
use crate::scheduler::Scheduler;
use crate::simulator::{SimulationConfig, WalkSimulator};
use crate::{sort_spots, GpsPoint, Route, RouteStyle, TourSpot};

/// Per-session tuning.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub simulation: SimulationConfig,
    pub route_style: RouteStyle,
}

/// Application context for one tour: spots, route, simulation, proximity.
pub struct TourSession {
    spots: Vec<TourSpot>,
    builder: RouteBuilder,
    simulator: Arc<Mutex<WalkSimulator>>,
    detector: ProximityDetector,
}

impl TourSession {
    /// Session without a directions provider: routes are straight-line paths.
    pub fn new(spots: Vec<TourSpot>, config: SessionConfig) -> Self {
        let builder = RouteBuilder::new().style(config.route_style.clone());
        Self::assemble(spots, builder, config)
    }

    /// Session with a walking-directions provider.
    pub fn with_provider(
        spots: Vec<TourSpot>,
        provider: Arc<dyn DirectionsProvider>,
        config: SessionConfig,
    ) -> Self {
        let builder = RouteBuilder::with_provider(provider).style(config.route_style.clone());
        Self::assemble(spots, builder, config)
    }

    fn assemble(mut spots: Vec<TourSpot>, builder: RouteBuilder, config: SessionConfig) -> Self {
        sort_spots(&mut spots);

        // Until a route is built the simulator walks the raw waypoints.
        let path: Vec<GpsPoint> = spots.iter().map(|s| s.coordinates).collect();
        let simulator = Arc::new(Mutex::new(WalkSimulator::new(
            path,
            spots.clone(),
            config.simulation.clone(),
        )));

        Self {
            detector: ProximityDetector::new(spots.clone()),
            spots,
            builder,
            simulator,
        }
    }

    /// Spots in route order.
    pub fn spots(&self) -> &[TourSpot] {
        &self.spots
    }

    /// Camera position framing all spots.
    pub fn camera_position(&self) -> CameraPosition {
        let points: Vec<GpsPoint> = self.spots.iter().map(|s| s.coordinates).collect();
        CameraPosition::fit(&points)
    }

    /// Build (or fetch from cache) the route for the current spots, and point
    /// the simulator at it.
    ///
    /// `None` with fewer than 2 spots. A running simulation is only disturbed
    /// when the path actually changed.
    pub async fn route(&mut self) -> Option<Route> {
        let route = self.builder.build_route(&self.spots).await?;

        let mut simulator = self.simulator.lock().unwrap();
        if simulator.path() != route.points.as_slice() {
            simulator.set_path(route.points.clone());
        }

        Some(route)
    }

    /// The shared simulator, for driving ticks directly.
    pub fn simulator(&self) -> Arc<Mutex<WalkSimulator>> {
        Arc::clone(&self.simulator)
    }

    /// A runner binding this session's simulator to a scheduler.
    pub fn runner(&self, scheduler: Arc<dyn Scheduler>) -> SimulationRunner {
        SimulationRunner::new(self.simulator(), scheduler)
    }

    /// Feed a position (real GPS or simulated) into the proximity detector.
    /// Returns the newly surfaced spot, if this update arrived at one.
    pub fn handle_position(&mut self, position: GpsPoint) -> Option<TourSpot> {
        self.detector.update(position).cloned()
    }

    pub fn nearby_spot(&self) -> Option<&TourSpot> {
        self.detector.nearby_spot()
    }

    /// Dismiss the surfaced spot; it will not re-trigger this session.
    pub fn clear_nearby(&mut self) {
        self.detector.clear_nearby();
    }

    /// Replace the tour's spots. The route cache keys on coordinates, so the
    /// next [`TourSession::route`] call rebuilds; the simulator resets to the
    /// new waypoints; the proximity shown set carries over (same
    /// `position_order` stays dismissed).
    pub fn set_spots(&mut self, mut spots: Vec<TourSpot>) {
        sort_spots(&mut spots);

        {
            let mut simulator = self.simulator.lock().unwrap();
            simulator.set_path(spots.iter().map(|s| s.coordinates).collect());
            simulator.set_spots(spots.clone());
        }
        self.detector.set_spots(spots.clone());
        self.spots = spots;
    }

    /// Session teardown (leaving the screen): reset the simulation and clear
    /// the proximity shown set.
    pub fn reset(&mut self) {
        self.simulator.lock().unwrap().reset();
        self.detector.reset();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::BoxFuture;
    use crate::Result;

    fn tour() -> Vec<TourSpot> {
        vec![
            TourSpot::new("gate", 0, GpsPoint::new(0.0, 0.0)),
            TourSpot::new("fountain", 1, GpsPoint::new(0.0, 0.001)),
        ]
    }

    struct FixedProvider(Vec<GpsPoint>);

    impl DirectionsProvider for FixedProvider {
        fn walking_route<'a>(
            &'a self,
            _origin: GpsPoint,
            _destination: GpsPoint,
            _via: &'a [GpsPoint],
        ) -> BoxFuture<'a, Result<Vec<GpsPoint>>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    #[tokio::test]
    async fn test_route_fallback_equals_spots() {
        let mut session = TourSession::new(tour(), SessionConfig::default());
        let route = session.route().await.unwrap();
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.points[1], GpsPoint::new(0.0, 0.001));
    }

    #[tokio::test]
    async fn test_route_updates_simulator_path() {
        let detour = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0002, 0.0005),
            GpsPoint::new(0.0, 0.001),
        ];
        let mut session = TourSession::with_provider(
            tour(),
            Arc::new(FixedProvider(detour.clone())),
            SessionConfig::default(),
        );

        session.route().await.unwrap();
        let simulator = session.simulator();
        assert_eq!(simulator.lock().unwrap().path(), detour.as_slice());
    }

    #[tokio::test]
    async fn test_repeat_route_does_not_reset_running_simulation() {
        let mut session = TourSession::new(tour(), SessionConfig::default());
        session.route().await.unwrap();

        {
            let simulator = session.simulator();
            let mut sim = simulator.lock().unwrap();
            sim.start().unwrap();
            sim.tick().unwrap();
        }

        // Same spots, cached route, identical path: the run continues.
        session.route().await.unwrap();
        assert!(session.simulator().lock().unwrap().is_running());
    }

    #[test]
    fn test_position_flow_and_dismiss() {
        let mut session = TourSession::new(tour(), SessionConfig::default());

        let arrived = session.handle_position(GpsPoint::new(0.0, 0.00001)).unwrap();
        assert_eq!(arrived.title, "gate");
        assert_eq!(session.nearby_spot().unwrap().title, "gate");

        session.clear_nearby();
        assert!(session.nearby_spot().is_none());
        // Still shown: no re-trigger.
        assert!(session.handle_position(GpsPoint::new(0.0, 0.00001)).is_none());
    }

    #[test]
    fn test_set_spots_keeps_shown_set() {
        let mut session = TourSession::new(tour(), SessionConfig::default());
        session.handle_position(GpsPoint::new(0.0, 0.00001)).unwrap();

        // Same position_order 0 in the replacement list stays dismissed.
        session.set_spots(vec![
            TourSpot::new("gate-renamed", 0, GpsPoint::new(0.0, 0.0)),
            TourSpot::new("new-fountain", 1, GpsPoint::new(0.0, 0.002)),
        ]);
        assert!(session.handle_position(GpsPoint::new(0.0, 0.00001)).is_none());
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut session = TourSession::new(tour(), SessionConfig::default());
        session.handle_position(GpsPoint::new(0.0, 0.00001)).unwrap();

        session.reset();
        assert!(session.nearby_spot().is_none());
        // Shown set cleared: the spot can surface again.
        assert!(session.handle_position(GpsPoint::new(0.0, 0.00001)).is_some());
    }

    #[test]
    fn test_spots_sorted_and_camera() {
        let session = TourSession::new(
            vec![
                TourSpot::new("b", 1, GpsPoint::new(0.0, 0.001)),
                TourSpot::new("a", 0, GpsPoint::new(0.0, 0.0)),
            ],
            SessionConfig::default(),
        );
        assert_eq!(session.spots()[0].title, "a");

        let camera = session.camera_position();
        assert_eq!(camera.zoom, 15);
        assert!((camera.coordinates.longitude - 0.0005).abs() < 1e-12);
    }
}
