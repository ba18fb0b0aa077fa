//! # Geographic Utilities
//!
//! Core geographic computation for the tour pipeline: great-circle distance,
//! linear interpolation, path length, and map camera framing.
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees), the
//! standard used by GPS receivers and mapping services.
//!
//! ## Accuracy Notes
//!
//! [`interpolate_position`] interpolates latitude and longitude independently
//! rather than along a geodesic. At city-tour scale (routes of at most tens of
//! kilometers) the error is negligible; do not use it for global-scale paths.

use crate::{GpsPoint, Bounds};
use geo::{Distance, Haversine, Point};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the
/// Haversine formula (spherical Earth, radius 6,371 km).
///
/// Returns `f64::INFINITY` when either point has invalid coordinates. Callers
/// must treat that as "unreachable" — it is never 0.
///
/// # Example
///
/// ```rust
/// use tour_sim::GpsPoint;
/// use tour_sim::geo_utils::haversine_distance;
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    if !p1.is_valid() || !p2.is_valid() {
        return f64::INFINITY;
    }
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Linearly interpolate between two points.
///
/// `t` = 0 yields `a`, `t` = 1 yields `b`; `t` is clamped to [0, 1].
/// Latitude and longitude are interpolated independently (not geodesic).
#[inline]
pub fn interpolate_position(a: &GpsPoint, b: &GpsPoint, t: f64) -> GpsPoint {
    let t = t.clamp(0.0, 1.0);
    GpsPoint::new(
        a.latitude + t * (b.latitude - a.latitude),
        a.longitude + t * (b.longitude - a.longitude),
    )
}

/// Calculate the total length of a path in meters.
///
/// Sums the haversine distance between consecutive points. Empty or
/// single-point paths return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Camera Framing
// =============================================================================

/// A map camera position that frames a set of spots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub coordinates: GpsPoint,
    pub zoom: u8,
}

/// Fallback camera position (Athens) when there is nothing to frame.
pub const DEFAULT_CAMERA_POSITION: CameraPosition = CameraPosition {
    coordinates: GpsPoint {
        latitude: 37.9838,
        longitude: 23.7275,
    },
    zoom: 13,
};

impl CameraPosition {
    /// Compute a camera position that fits all given points.
    ///
    /// Zoom bands are chosen from the bounding-box extent: a single point gets
    /// a close-in zoom, wider tours zoom out progressively.
    pub fn fit(points: &[GpsPoint]) -> CameraPosition {
        if points.is_empty() {
            return DEFAULT_CAMERA_POSITION;
        }
        if points.len() == 1 {
            return CameraPosition {
                coordinates: points[0],
                zoom: 15,
            };
        }

        // Unwrap is fine: points is non-empty here.
        let bounds = Bounds::from_points(points).unwrap();
        let lat_delta = bounds.max_lat - bounds.min_lat;
        let lng_delta = bounds.max_lng - bounds.min_lng;
        let max_delta = lat_delta.max(lng_delta);

        let zoom = if max_delta < 0.01 {
            15
        } else if max_delta < 0.05 {
            13
        } else if max_delta < 0.1 {
            11
        } else {
            10
        };

        CameraPosition {
            coordinates: bounds.center(),
            zoom,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let a = GpsPoint::new(51.5074, -0.1278);
        let b = GpsPoint::new(48.8566, 2.3522);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere on the sphere.
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(1.0, 0.0);
        let dist = haversine_distance(&a, &b);
        assert!(approx_eq(dist, 111_200.0, 1_112.0)); // within 1%
    }

    #[test]
    fn test_haversine_invalid_point_is_unreachable() {
        let good = GpsPoint::new(51.5074, -0.1278);
        let bad = GpsPoint::new(f64::NAN, -0.1278);
        assert_eq!(haversine_distance(&good, &bad), f64::INFINITY);
        assert_eq!(haversine_distance(&bad, &good), f64::INFINITY);

        let out_of_range = GpsPoint::new(91.0, 0.0);
        assert_eq!(haversine_distance(&good, &out_of_range), f64::INFINITY);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = GpsPoint::new(51.50, -0.13);
        let b = GpsPoint::new(51.52, -0.11);
        assert_eq!(interpolate_position(&a, &b, 0.0), a);
        assert_eq!(interpolate_position(&a, &b, 1.0), b);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = GpsPoint::new(51.50, -0.13);
        let b = GpsPoint::new(51.52, -0.11);
        let mid = interpolate_position(&a, &b, 0.5);
        assert!(approx_eq(mid.latitude, 51.51, 1e-12));
        assert!(approx_eq(mid.longitude, -0.12, 1e-12));
    }

    #[test]
    fn test_interpolate_clamps_t() {
        let a = GpsPoint::new(51.50, -0.13);
        let b = GpsPoint::new(51.52, -0.11);
        assert_eq!(interpolate_position(&a, &b, -0.5), a);
        assert_eq!(interpolate_position(&a, &b, 1.5), b);
    }

    #[test]
    fn test_polyline_length_degenerate() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(51.5074, -0.1278)]), 0.0);
    }

    #[test]
    fn test_polyline_length_two_points() {
        let track = vec![
            GpsPoint::new(51.5074, -0.1278),
            GpsPoint::new(51.5080, -0.1280),
        ];
        let length = polyline_length(&track);
        assert!(length > 0.0);
        assert!(length < 100.0); // about 68m
    }

    #[test]
    fn test_camera_fit_empty_uses_default() {
        assert_eq!(CameraPosition::fit(&[]), DEFAULT_CAMERA_POSITION);
    }

    #[test]
    fn test_camera_fit_single_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        let cam = CameraPosition::fit(&[p]);
        assert_eq!(cam.coordinates, p);
        assert_eq!(cam.zoom, 15);
    }

    #[test]
    fn test_camera_fit_zoom_bands() {
        let tight = vec![GpsPoint::new(51.500, -0.130), GpsPoint::new(51.505, -0.128)];
        assert_eq!(CameraPosition::fit(&tight).zoom, 15);

        let wide = vec![GpsPoint::new(51.40, -0.30), GpsPoint::new(51.60, -0.10)];
        assert_eq!(CameraPosition::fit(&wide).zoom, 10);
    }
}
