//! # Tick Scheduling
//!
//! A small abstraction over "call this closure every N milliseconds until
//! cancelled", so the simulation core never depends on how ticks are
//! delivered. [`TokioScheduler`] (feature `timers`) drives ticks off a tokio
//! timer; [`ManualScheduler`] lets tests fire ticks deterministically with no
//! real time involved.
//!
//! Cancellation discipline: a [`TaskHandle`] may be cancelled repeatedly and
//! from any state, and a cancelled task never ticks again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Whether a scheduled task should keep running after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// The closure a scheduler drives.
pub type TickFn = Box<dyn FnMut() -> TickOutcome + Send>;

/// A source of repeating ticks.
pub trait Scheduler: Send + Sync {
    /// Schedule `tick` to run every `interval` until it returns
    /// [`TickOutcome::Stop`] or the returned handle is cancelled.
    fn schedule_repeating(&self, interval: Duration, tick: TickFn) -> TaskHandle;
}

/// Cancellable handle to a scheduled repeating task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the task. Safe to call multiple times and from any state.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tokio Scheduler
// ============================================================================

/// Scheduler backed by `tokio::time`. Must be used from within a tokio
/// runtime.
#[cfg(feature = "timers")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "timers")]
impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut tick: TickFn) -> TaskHandle {
        let handle = TaskHandle::new();
        let task_handle = handle.clone();

        // tokio panics on a zero-period interval.
        let interval = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; skip it so ticks
            // start one full period after scheduling.
            timer.tick().await;

            loop {
                timer.tick().await;
                if task_handle.is_cancelled() {
                    break;
                }
                if tick() == TickOutcome::Stop {
                    break;
                }
            }
        });

        handle
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

struct ManualTask {
    tick: TickFn,
    handle: TaskHandle,
}

/// Deterministic scheduler for tests and host-driven render loops: ticks fire
/// only when [`ManualScheduler::fire`] is called.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<ManualTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one tick on every live task, dropping tasks that stop or were
    /// cancelled. Returns the number of ticks fired.
    pub fn fire(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap();
        let mut fired = 0;

        tasks.retain_mut(|task| {
            if task.handle.is_cancelled() {
                return false;
            }
            fired += 1;
            match (task.tick)() {
                TickOutcome::Continue => true,
                TickOutcome::Stop => false,
            }
        });

        fired
    }

    /// Fire repeatedly until no live task remains, up to `max_rounds`.
    /// Returns the total number of ticks fired.
    pub fn fire_until_idle(&self, max_rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_rounds {
            let fired = self.fire();
            if fired == 0 {
                break;
            }
            total += fired;
        }
        total
    }

    /// Number of tasks still scheduled (cancelled tasks are pruned lazily on
    /// the next `fire`).
    pub fn live_tasks(&self) -> usize {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.handle.is_cancelled())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, _interval: Duration, tick: TickFn) -> TaskHandle {
        let handle = TaskHandle::new();
        self.tasks.lock().unwrap().push(ManualTask {
            tick,
            handle: handle.clone(),
        });
        handle
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_tick(counter: Arc<AtomicUsize>, stop_after: usize) -> TickFn {
        Box::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= stop_after {
                TickOutcome::Stop
            } else {
                TickOutcome::Continue
            }
        })
    }

    #[test]
    fn test_manual_fire_counts() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_repeating(Duration::from_millis(10), counting_tick(counter.clone(), 3));

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.fire(), 1); // returns Stop, task removed
        assert_eq!(scheduler.fire(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancelled_task_never_ticks() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler
            .schedule_repeating(Duration::from_millis(10), counting_tick(counter.clone(), 100));

        handle.cancel();
        handle.cancel(); // idempotent

        assert_eq!(scheduler.fire(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[test]
    fn test_fire_until_idle() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_repeating(Duration::from_millis(10), counting_tick(counter.clone(), 5));

        let fired = scheduler.fire_until_idle(1000);
        assert_eq!(fired, 5);
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[cfg(feature = "timers")]
    #[tokio::test]
    async fn test_tokio_scheduler_ticks_and_stops() {
        let scheduler = TokioScheduler;
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_repeating(Duration::from_millis(5), counting_tick(counter.clone(), 3));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[cfg(feature = "timers")]
    #[tokio::test]
    async fn test_tokio_scheduler_cancel() {
        let scheduler = TokioScheduler;
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler
            .schedule_repeating(Duration::from_millis(5), counting_tick(counter.clone(), 1000));

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
