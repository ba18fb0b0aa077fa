//! # Proximity Detection
//!
//! Watches a stream of positions (real GPS or simulated) and surfaces
//! "arrived at spot" events. Each spot fires at most once per session, and at
//! most one spot is surfaced at a time.
//!
//! Scan order is stable (`position_order`): when two spots' radii overlap at
//! the same location, the winner is whichever comes first in the list, not the
//! geometrically closest. That tie-break is inherited app behavior, kept as-is
//! rather than silently changed to nearest-match.

use std::collections::HashSet;

use log::debug;

use crate::geo_utils::haversine_distance;
use crate::{sort_spots, GpsPoint, TourSpot};

/// Shared arrival threshold for the uniform-radius variant, in meters.
pub const DEFAULT_PROXIMITY_THRESHOLD_M: f64 = 40.0;

/// Session-scoped arrival detector over a fixed spot list.
#[derive(Debug)]
pub struct ProximityDetector {
    spots: Vec<TourSpot>,
    /// When set, overrides every spot's own reach radius.
    shared_threshold_m: Option<f64>,
    nearby: Option<usize>,
    shown: HashSet<u32>,
}

impl ProximityDetector {
    /// Detector using each spot's own `reach_radius_m`.
    pub fn new(mut spots: Vec<TourSpot>) -> Self {
        sort_spots(&mut spots);
        Self {
            spots,
            shared_threshold_m: None,
            nearby: None,
            shown: HashSet::new(),
        }
    }

    /// Simpler variant: one shared threshold for every spot.
    pub fn with_threshold(mut spots: Vec<TourSpot>, threshold_m: f64) -> Self {
        sort_spots(&mut spots);
        Self {
            spots,
            shared_threshold_m: Some(threshold_m),
            nearby: None,
            shown: HashSet::new(),
        }
    }

    /// Process one position update.
    ///
    /// Scans spots in `position_order`; the first spot within its radius that
    /// has not been shown this session becomes the nearby spot, is added to
    /// the shown set, and is returned. Later spots are not considered until a
    /// subsequent update. No spots configured is a no-op.
    pub fn update(&mut self, position: GpsPoint) -> Option<&TourSpot> {
        if self.spots.is_empty() {
            return None;
        }

        let found = self.spots.iter().position(|spot| {
            if self.shown.contains(&spot.position_order) {
                return false;
            }
            let radius = self.shared_threshold_m.unwrap_or(spot.reach_radius_m);
            haversine_distance(&position, &spot.coordinates) <= radius
        })?;

        let spot = &self.spots[found];
        debug!(
            "[ProximityDetector] arrived at \"{}\" (order {})",
            spot.title, spot.position_order
        );
        self.shown.insert(spot.position_order);
        self.nearby = Some(found);
        self.spots.get(found)
    }

    /// The currently surfaced spot, if any.
    pub fn nearby_spot(&self) -> Option<&TourSpot> {
        self.nearby.and_then(|i| self.spots.get(i))
    }

    /// Dismiss the surfaced spot. It stays in the shown set and will not
    /// re-trigger this session.
    pub fn clear_nearby(&mut self) {
        self.nearby = None;
    }

    /// Spots already surfaced this session, by `position_order`.
    pub fn shown_spots(&self) -> &HashSet<u32> {
        &self.shown
    }

    /// Session teardown (leaving the screen): clears the shown set and any
    /// surfaced spot.
    pub fn reset(&mut self) {
        self.nearby = None;
        self.shown.clear();
    }

    /// Replace the spot list, keeping the session's shown set (spots with an
    /// already-shown `position_order` stay dismissed). Clears any surfaced
    /// spot, since its index may no longer be valid.
    pub fn set_spots(&mut self, mut spots: Vec<TourSpot>) {
        sort_spots(&mut spots);
        self.nearby = None;
        self.spots = spots;
    }

    /// The spot list in scan order.
    pub fn spots(&self) -> &[TourSpot] {
        &self.spots
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(title: &str, order: u32, lng: f64, radius: f64) -> TourSpot {
        TourSpot::new(title, order, GpsPoint::new(0.0, lng)).with_reach_radius(radius)
    }

    #[test]
    fn test_no_spots_is_noop() {
        let mut detector = ProximityDetector::new(Vec::new());
        assert!(detector.update(GpsPoint::new(0.0, 0.0)).is_none());
        assert!(detector.nearby_spot().is_none());
    }

    #[test]
    fn test_arrival_within_radius() {
        let mut detector = ProximityDetector::new(vec![spot("a", 0, 0.0, 50.0)]);

        // ~111 m away: outside the 50 m radius.
        assert!(detector.update(GpsPoint::new(0.0, 0.001)).is_none());

        // ~11 m away: inside.
        let arrived = detector.update(GpsPoint::new(0.0, 0.0001)).unwrap();
        assert_eq!(arrived.title, "a");
        assert_eq!(detector.nearby_spot().unwrap().title, "a");
    }

    #[test]
    fn test_overlapping_spots_first_in_order_wins() {
        // Both spots cover the same location; scan order decides.
        let mut detector = ProximityDetector::new(vec![
            spot("b", 1, 0.0002, 100.0),
            spot("a", 0, 0.0, 100.0),
        ]);

        let arrived = detector.update(GpsPoint::new(0.0, 0.0001)).unwrap();
        assert_eq!(arrived.title, "a");

        // A is now shown; the same position surfaces B next.
        let arrived = detector.update(GpsPoint::new(0.0, 0.0001)).unwrap();
        assert_eq!(arrived.title, "b");
    }

    #[test]
    fn test_dismiss_does_not_retrigger() {
        let mut detector = ProximityDetector::new(vec![spot("a", 0, 0.0, 50.0)]);
        let inside = GpsPoint::new(0.0, 0.0001);

        assert!(detector.update(inside).is_some());
        detector.clear_nearby();
        assert!(detector.nearby_spot().is_none());

        // Lingering in range must not surface the spot again.
        assert!(detector.update(inside).is_none());
        assert!(detector.nearby_spot().is_none());
    }

    #[test]
    fn test_per_spot_radius() {
        let mut detector = ProximityDetector::new(vec![
            spot("tight", 0, 0.0, 5.0),
            spot("wide", 1, 0.0, 200.0),
        ]);

        // ~111 m out: outside "tight", inside "wide".
        let arrived = detector.update(GpsPoint::new(0.0, 0.001)).unwrap();
        assert_eq!(arrived.title, "wide");
    }

    #[test]
    fn test_shared_threshold_variant() {
        // Spot's own radius says 200 m but the shared threshold is 40 m.
        let mut detector =
            ProximityDetector::with_threshold(vec![spot("a", 0, 0.0, 200.0)], 40.0);

        assert!(detector.update(GpsPoint::new(0.0, 0.001)).is_none());
        assert!(detector.update(GpsPoint::new(0.0, 0.0001)).is_some());
    }

    #[test]
    fn test_invalid_position_never_arrives() {
        let mut detector = ProximityDetector::new(vec![spot("a", 0, 0.0, 50.0)]);
        assert!(detector.update(GpsPoint::new(f64::NAN, 0.0)).is_none());
    }

    #[test]
    fn test_reset_allows_retrigger() {
        let mut detector = ProximityDetector::new(vec![spot("a", 0, 0.0, 50.0)]);
        let inside = GpsPoint::new(0.0, 0.0001);

        assert!(detector.update(inside).is_some());
        detector.reset();
        assert!(detector.shown_spots().is_empty());
        assert!(detector.update(inside).is_some());
    }

    #[test]
    fn test_spots_sorted_by_position_order() {
        let detector = ProximityDetector::new(vec![
            spot("second", 1, 0.1, 50.0),
            spot("first", 0, 0.0, 50.0),
        ]);
        let titles: Vec<&str> = detector.spots().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
