//! # Position Sources
//!
//! The core treats device location purely as an async position source:
//! request one fix, or subscribe to a stream of updates at a time/distance
//! interval. Platform plumbing (permissions, GPS hardware) lives behind the
//! [`PositionSource`] trait in the embedding app.
//!
//! Teardown is the invariant that matters: removing a watch (or dropping it)
//! guarantees no further callback runs into a disposed view.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Boxed future, the object-safe async style used at provider seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback invoked with each position update.
pub type PositionUpdateFn = Arc<dyn Fn(GpsPoint) + Send + Sync>;

/// How often a watch should report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Minimum time between updates.
    pub time_interval: Duration,
    /// Minimum movement between updates, in meters.
    pub distance_interval_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            time_interval: Duration::from_secs(1),
            distance_interval_m: 5.0,
        }
    }
}

/// An async source of positions (device GPS, or a simulation).
pub trait PositionSource: Send + Sync {
    /// One-shot current position; `None` when no fix is available.
    fn current_position(&self) -> BoxFuture<'_, Option<GpsPoint>>;

    /// Subscribe to position updates. The subscription lasts until the
    /// returned watch is removed or dropped.
    fn watch(&self, options: WatchOptions, callback: PositionUpdateFn) -> PositionWatch;
}

/// Handle to an active position subscription.
///
/// Removing it (explicitly or by drop) detaches the callback; removal is
/// idempotent.
pub struct PositionWatch {
    active: Arc<AtomicBool>,
}

impl PositionWatch {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared flag a source implementation checks before dispatching.
    pub fn activation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Detach the subscription. Safe to call multiple times.
    pub fn remove(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Default for PositionWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.remove();
    }
}

// ============================================================================
// Simulated Source
// ============================================================================

struct Subscriber {
    callback: PositionUpdateFn,
    active: Arc<AtomicBool>,
    distance_interval_m: f64,
    last_dispatched: Option<GpsPoint>,
}

/// In-memory position source: positions pushed by the host (or a walk
/// simulator's position callback) are fanned out to subscribers, honoring
/// each watch's distance interval.
#[derive(Default)]
pub struct SimulatedPositionSource {
    state: Mutex<SimulatedState>,
}

#[derive(Default)]
struct SimulatedState {
    last_position: Option<GpsPoint>,
    subscribers: Vec<Subscriber>,
}

impl SimulatedPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a position into the source, dispatching to live subscribers.
    pub fn push(&self, position: GpsPoint) {
        let callbacks: Vec<PositionUpdateFn> = {
            let mut state = self.state.lock().unwrap();
            state.last_position = Some(position);

            state.subscribers.retain(|s| s.active.load(Ordering::SeqCst));
            state
                .subscribers
                .iter_mut()
                .filter(|s| match s.last_dispatched {
                    // Below the distance interval: suppress, keep the old anchor.
                    Some(last) => {
                        haversine_distance(&last, &position) >= s.distance_interval_m
                    }
                    None => true,
                })
                .map(|s| {
                    s.last_dispatched = Some(position);
                    Arc::clone(&s.callback)
                })
                .collect()
        };

        // Dispatch outside the lock so callbacks may push again.
        for callback in callbacks {
            callback(position);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.subscribers.retain(|s| s.active.load(Ordering::SeqCst));
        state.subscribers.len()
    }
}

impl PositionSource for SimulatedPositionSource {
    fn current_position(&self) -> BoxFuture<'_, Option<GpsPoint>> {
        Box::pin(async move { self.state.lock().unwrap().last_position })
    }

    fn watch(&self, options: WatchOptions, callback: PositionUpdateFn) -> PositionWatch {
        let watch = PositionWatch::new();
        self.state.lock().unwrap().subscribers.push(Subscriber {
            callback,
            active: watch.activation_flag(),
            distance_interval_m: options.distance_interval_m,
            last_dispatched: None,
        });
        watch
    }
}

// ============================================================================
// Tests
// ============================================================================
