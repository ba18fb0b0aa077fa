//! # Tour Sim
//!
//! Walking-tour route building, trip simulation, and spot proximity detection.
//!
//! This library implements the geospatial core of a tour-discovery mobile app:
//! - Building a displayable walking route from an ordered list of tour spots,
//!   either from a directions provider (decoded polyline) or a straight-line
//!   fallback
//! - Simulating a walker moving along that route on a repeating tick
//! - Detecting arrival at spots to drive one-time "you are here" notifications
//!
//! ## Features
//!
//! - **`http`** - Enable the HTTP directions client (reqwest)
//! - **`timers`** - Enable the tokio-backed tick scheduler
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use tour_sim::{GpsPoint, SimulationConfig, WalkSimulator};
//!
//! let path = vec![
//!     GpsPoint::new(51.5074, -0.1278),
//!     GpsPoint::new(51.5080, -0.1290),
//!     GpsPoint::new(51.5090, -0.1300),
//! ];
//!
//! let mut sim = WalkSimulator::new(path, Vec::new(), SimulationConfig::default());
//! if let Some(plan) = sim.start() {
//!     // Drive `sim.tick()` once per `plan.step_interval` (see `SimulationRunner`
//!     // for the scheduler-backed version).
//!     let tick = sim.tick().unwrap();
//!     assert!(tick.position.is_some());
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TourSimError};

// Geographic utilities (distance, interpolation, bounds, camera framing)
pub mod geo_utils;
pub use geo_utils::{CameraPosition, DEFAULT_CAMERA_POSITION};

// Encoded-polyline codec (directions provider wire format)
pub mod polyline_codec;
pub use polyline_codec::{decode_polyline, encode_polyline};

// Route memoization (LRU + TTL)
pub mod route_cache;
pub use route_cache::RouteCache;

// Route building (directions provider + straight-line fallback)
pub mod route_builder;
pub use route_builder::{DirectionsProvider, RouteBuilder, MAX_VIA_WAYPOINTS};

// Walk simulation core (pure, timer-free)
pub mod simulator;
pub use simulator::{
    position_along_route, simulation_duration, SimulationConfig, SimulationPlan, SimulationTick,
    WalkSimulator,
};

// Repeating-tick scheduling (cancellable handles, manual driver for tests)
pub mod scheduler;
#[cfg(feature = "timers")]
pub use scheduler::TokioScheduler;
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, TickFn, TickOutcome};

// Scheduler-driven simulation with callbacks
pub mod runner;
pub use runner::{PositionCallback, SimulationRunner, SpotReachedCallback};

// One-shot spot arrival detection
pub mod proximity;
pub use proximity::{ProximityDetector, DEFAULT_PROXIMITY_THRESHOLD_M};

// Device-position abstraction (watch subscriptions)
pub mod location;
pub use location::{
    BoxFuture, PositionSource, PositionUpdateFn, PositionWatch, SimulatedPositionSource,
    WatchOptions,
};

// Address resolution for authored/generated spots
pub mod geocoding;
pub use geocoding::{geocode_with_fallback, resolve_spots, Geocoder, SpotDraft};

// Per-tour application context (replaces the app's ambient stores)
pub mod session;
pub use session::{SessionConfig, TourSession};

// HTTP directions client
#[cfg(feature = "http")]
pub mod directions;
#[cfg(feature = "http")]
pub use directions::DirectionsClient;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use tour_sim::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Default arrival radius for a spot, in meters.
pub const DEFAULT_REACH_RADIUS_M: f64 = 50.0;

/// A point of interest on a tour: coordinates plus descriptive metadata.
///
/// Spots are ordered by `position_order` (unique and contiguous within a tour)
/// and carry their own arrival radius for proximity detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSpot {
    pub title: String,
    pub description: String,
    /// Route sequence index; spots are sorted by this before use.
    pub position_order: u32,
    pub coordinates: GpsPoint,
    /// Arrival radius in meters.
    pub reach_radius_m: f64,
}

impl TourSpot {
    pub fn new(title: &str, position_order: u32, coordinates: GpsPoint) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            position_order,
            coordinates,
            reach_radius_m: DEFAULT_REACH_RADIUS_M,
        }
    }

    pub fn with_reach_radius(mut self, radius_m: f64) -> Self {
        self.reach_radius_m = radius_m;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Sort spots by `position_order`, in place.
pub fn sort_spots(spots: &mut [TourSpot]) {
    spots.sort_by_key(|s| s.position_order);
}

/// Rendering identity for built routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStyle {
    pub id: String,
    pub color: String,
    pub width: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            id: "tour-route".to_string(),
            color: "#365314".to_string(),
            width: 2.0,
        }
    }
}

/// A displayable route: the coordinate sequence a walker follows, plus the
/// identifier and styling the map layer renders it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub points: Vec<GpsPoint>,
    pub color: String,
    pub width: f64,
}

impl Route {
    pub fn new(points: Vec<GpsPoint>) -> Self {
        Self::with_style(points, &RouteStyle::default())
    }

    pub fn with_style(points: Vec<GpsPoint>, style: &RouteStyle) -> Self {
        Self {
            id: style.id.clone(),
            points,
            color: style.color.clone(),
            width: style.width,
        }
    }

    /// Total route length in meters.
    pub fn length_m(&self) -> f64 {
        geo_utils::polyline_length(&self.points)
    }
}

/// Bounding box for a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
