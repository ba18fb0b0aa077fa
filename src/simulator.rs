//! # Walk Simulator
//!
//! Advances a virtual walker along a route as a function of elapsed time and a
//! speed multiplier, in discrete steps, detecting when the walker passes
//! within a threshold of any tour spot.
//!
//! The core is deliberately timer-free: [`WalkSimulator::start`] returns a
//! [`SimulationPlan`] describing how often [`WalkSimulator::tick`] should be
//! called, and the progress-to-position mapping is a pure function
//! ([`position_along_route`]). Tick delivery is the job of a
//! [`Scheduler`](crate::scheduler::Scheduler) (see
//! [`SimulationRunner`](crate::runner::SimulationRunner)); tests drive ticks
//! directly.

use std::collections::HashSet;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, interpolate_position, polyline_length};
use crate::{GpsPoint, TourSpot, DEFAULT_REACH_RADIUS_M};

/// Assumed walking speed, in meters per second (~5 km/h).
pub const WALKING_SPEED_M_S: f64 = 1.39;

/// Shortest simulation the planner will produce.
pub const MIN_DURATION: Duration = Duration::from_millis(100);

/// Shortest interval between two ticks.
pub const MIN_STEP_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Pure Functions
// ============================================================================

/// How long a simulated walk over `total_distance_m` meters takes at the given
/// speed multiplier, floored at [`MIN_DURATION`].
///
/// 139 m at multiplier 1 is 100 seconds; doubling the multiplier halves the
/// duration.
pub fn simulation_duration(total_distance_m: f64, speed_multiplier: f64) -> Duration {
    let seconds = (total_distance_m / WALKING_SPEED_M_S) / speed_multiplier;
    Duration::from_secs_f64(seconds).max(MIN_DURATION)
}

/// Map a progress fraction to a position along a path.
///
/// The path is treated as `len - 1` equal-progress segments: the current
/// segment is `floor(progress * segment_count)` and the position is linearly
/// interpolated within it. Progress is clamped to [0, 1]. Paths with fewer
/// than 2 points have no position.
pub fn position_along_route(progress: f64, path: &[GpsPoint]) -> Option<GpsPoint> {
    if path.len() < 2 {
        return None;
    }

    let segments = path.len() - 1;
    let scaled = progress.clamp(0.0, 1.0) * segments as f64;
    let index = (scaled.floor() as usize).min(segments - 1);
    let t = scaled - index as f64;

    Some(interpolate_position(&path[index], &path[index + 1], t))
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning for a simulated walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Playback speed relative to real walking pace. Must be positive.
    pub speed_multiplier: f64,
    /// Number of discrete animation steps over the whole route.
    pub step_count: u32,
    /// Distance within which a spot counts as reached, in meters.
    pub reach_threshold_m: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 2.0,
            step_count: 100,
            reach_threshold_m: DEFAULT_REACH_RADIUS_M,
        }
    }
}

/// Timing produced by [`WalkSimulator::start`] for the tick driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    /// Total wall-clock duration of the simulated walk.
    pub duration: Duration,
    /// Number of ticks the walk takes.
    pub steps: u32,
    /// Interval between ticks.
    pub step_interval: Duration,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTick {
    /// Progress fraction after this tick, in [0, 1].
    pub progress: f64,
    /// Interpolated walker position after this tick.
    pub position: Option<GpsPoint>,
    /// Indices (into the simulator's spot list) newly reached this tick.
    pub reached: Vec<usize>,
    /// True when this tick completed the walk (simulator is Idle again).
    pub completed: bool,
}

// ============================================================================
// Simulator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
}

/// State machine for a simulated walk along a route.
///
/// `path` is the coordinate sequence the walker follows (a built route, or the
/// raw waypoints when no route exists); `spots` are the points of interest
/// checked for arrival on every tick. Each spot's reached callback fires at
/// most once per run; restarting clears the reached set.
#[derive(Debug)]
pub struct WalkSimulator {
    path: Vec<GpsPoint>,
    spots: Vec<TourSpot>,
    config: SimulationConfig,
    phase: Phase,
    steps_taken: u32,
    progress: f64,
    position: Option<GpsPoint>,
    reached: HashSet<usize>,
}

impl WalkSimulator {
    pub fn new(path: Vec<GpsPoint>, spots: Vec<TourSpot>, config: SimulationConfig) -> Self {
        Self {
            path,
            spots,
            config,
            phase: Phase::Idle,
            steps_taken: 0,
            progress: 0.0,
            position: None,
            reached: HashSet::new(),
        }
    }

    /// Replace the path the walker follows. Stops and resets any run in
    /// progress: a new path invalidates progress made on the old one.
    pub fn set_path(&mut self, path: Vec<GpsPoint>) {
        self.reset();
        self.path = path;
    }

    /// Replace the spots checked for arrival. Also resets the current run.
    pub fn set_spots(&mut self, spots: Vec<TourSpot>) {
        self.reset();
        self.spots = spots;
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Progress fraction in [0, 1].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Current interpolated position; `None` before the first tick of a run
    /// and after a reset.
    pub fn position(&self) -> Option<GpsPoint> {
        self.position
    }

    /// Indices of spots reached during the current run.
    pub fn reached_spots(&self) -> &HashSet<usize> {
        &self.reached
    }

    /// The spots checked for arrival, in the order tick indices refer to.
    pub fn spots(&self) -> &[TourSpot] {
        &self.spots
    }

    /// The path the walker follows.
    pub fn path(&self) -> &[GpsPoint] {
        &self.path
    }

    /// Begin a run, returning the tick plan, or `None` when there is nothing
    /// to simulate (fewer than 2 path points, zero total distance, or a
    /// non-positive speed multiplier).
    ///
    /// Starting while already running restarts: progress and the reached set
    /// are cleared. The caller owns tick delivery; any previously scheduled
    /// ticks for this simulator must be cancelled first (see
    /// [`SimulationRunner`](crate::runner::SimulationRunner)).
    pub fn start(&mut self) -> Option<SimulationPlan> {
        self.phase = Phase::Idle;
        self.steps_taken = 0;
        self.progress = 0.0;
        self.reached.clear();

        if self.path.len() < 2 {
            return None;
        }
        if !(self.config.speed_multiplier > 0.0) {
            debug!(
                "[WalkSimulator] refusing non-positive speed multiplier {}",
                self.config.speed_multiplier
            );
            return None;
        }

        let total_distance = polyline_length(&self.path);
        if total_distance == 0.0 || !total_distance.is_finite() {
            debug!("[WalkSimulator] degenerate path, nothing to simulate");
            return None;
        }

        let duration = simulation_duration(total_distance, self.config.speed_multiplier);
        let steps = self.config.step_count.max(1);
        let step_interval = (duration / steps).max(MIN_STEP_INTERVAL);

        debug!(
            "[WalkSimulator] starting: {:.0}m over {:?} in {} steps",
            total_distance, duration, steps
        );

        self.phase = Phase::Running;
        Some(SimulationPlan {
            duration,
            steps,
            step_interval,
        })
    }

    /// Advance one step. Returns `None` when not running.
    ///
    /// Each tick advances progress by `1 / step_count`, recomputes the walker
    /// position, and checks the distance from the new position to every
    /// not-yet-reached spot against the reach threshold.
    pub fn tick(&mut self) -> Option<SimulationTick> {
        if self.phase != Phase::Running {
            return None;
        }

        // Derive progress from the step index rather than accumulating a float
        // increment, so the run completes at exactly `step_count` ticks.
        let steps = self.config.step_count.max(1);
        self.steps_taken = (self.steps_taken + 1).min(steps);
        self.progress = f64::from(self.steps_taken) / f64::from(steps);
        self.position = position_along_route(self.progress, &self.path);

        let mut newly_reached = Vec::new();
        if let Some(position) = self.position {
            for (index, spot) in self.spots.iter().enumerate() {
                if self.reached.contains(&index) {
                    continue;
                }
                let distance = haversine_distance(&position, &spot.coordinates);
                if distance <= self.config.reach_threshold_m {
                    self.reached.insert(index);
                    newly_reached.push(index);
                }
            }
        }

        let completed = self.progress >= 1.0;
        if completed {
            self.phase = Phase::Idle;
        }

        Some(SimulationTick {
            progress: self.progress,
            position: self.position,
            reached: newly_reached,
            completed,
        })
    }

    /// Stop without clearing position or progress. Idempotent.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Stop and clear all run state: progress, position, reached set.
    /// Idempotent, callable from any state.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.steps_taken = 0;
        self.progress = 0.0;
        self.position = None;
        self.reached.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
