//! # Simulation Runner
//!
//! Binds a shared [`WalkSimulator`] to a [`Scheduler`], turning tick results
//! into position and spot-reached callbacks.
//!
//! Lifetime discipline (the part worth being careful about):
//! - at most one live timer per runner — starting while running cancels the
//!   existing task before scheduling a new one
//! - stop/reset are idempotent and callable from any state
//! - dropping the runner cancels the task, so no callback can fire into a
//!   torn-down host view

use std::sync::{Arc, Mutex};

use crate::scheduler::{Scheduler, TaskHandle, TickOutcome};
use crate::simulator::{SimulationPlan, WalkSimulator};
use crate::{GpsPoint, TourSpot};

/// Callback invoked with the walker position after every tick.
pub type PositionCallback = Arc<dyn Fn(GpsPoint) + Send + Sync>;

/// Callback invoked once per run for each spot the walker reaches.
pub type SpotReachedCallback = Arc<dyn Fn(TourSpot) + Send + Sync>;

/// Drives a [`WalkSimulator`] from a scheduler, dispatching callbacks.
pub struct SimulationRunner {
    simulator: Arc<Mutex<WalkSimulator>>,
    scheduler: Arc<dyn Scheduler>,
    task: Option<TaskHandle>,
    on_position: Option<PositionCallback>,
    on_spot_reached: Option<SpotReachedCallback>,
}

impl SimulationRunner {
    pub fn new(simulator: Arc<Mutex<WalkSimulator>>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            simulator,
            scheduler,
            task: None,
            on_position: None,
            on_spot_reached: None,
        }
    }

    /// Set the position callback. Replaces any previous one.
    pub fn on_position(mut self, callback: PositionCallback) -> Self {
        self.on_position = Some(callback);
        self
    }

    /// Set the spot-reached callback. Replaces any previous one.
    pub fn on_spot_reached(mut self, callback: SpotReachedCallback) -> Self {
        self.on_spot_reached = Some(callback);
        self
    }

    /// The simulator this runner drives.
    pub fn simulator(&self) -> Arc<Mutex<WalkSimulator>> {
        Arc::clone(&self.simulator)
    }

    /// Start (or restart) the simulation.
    ///
    /// Any timer from a previous start is cancelled first, so each tick
    /// dispatches callbacks exactly once. Returns `None` when the simulator
    /// has nothing to run (degenerate path); no timer is scheduled in that
    /// case.
    pub fn start(&mut self) -> Option<SimulationPlan> {
        self.cancel_task();

        let plan = self.simulator.lock().unwrap().start()?;

        let simulator = Arc::clone(&self.simulator);
        let on_position = self.on_position.clone();
        let on_spot_reached = self.on_spot_reached.clone();

        let tick = Box::new(move || {
            // Hold the lock only while ticking; callbacks run outside it so
            // they may call back into the simulator.
            let (tick, reached) = {
                let mut sim = simulator.lock().unwrap();
                let Some(tick) = sim.tick() else {
                    return TickOutcome::Stop;
                };
                let reached: Vec<TourSpot> = tick
                    .reached
                    .iter()
                    .filter_map(|&i| sim.spots().get(i).cloned())
                    .collect();
                (tick, reached)
            };

            if let (Some(callback), Some(position)) = (&on_position, tick.position) {
                callback(position);
            }
            if let Some(callback) = &on_spot_reached {
                for spot in reached {
                    callback(spot);
                }
            }

            if tick.completed {
                TickOutcome::Stop
            } else {
                TickOutcome::Continue
            }
        });

        self.task = Some(self.scheduler.schedule_repeating(plan.step_interval, tick));
        Some(plan)
    }

    /// Stop the simulation, keeping position and progress. Idempotent.
    pub fn stop(&mut self) {
        self.cancel_task();
        self.simulator.lock().unwrap().stop();
    }

    /// Stop and clear all simulation state. Idempotent.
    pub fn reset(&mut self) {
        self.cancel_task();
        self.simulator.lock().unwrap().reset();
    }

    pub fn is_running(&self) -> bool {
        self.simulator.lock().unwrap().is_running()
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

// ============================================================================
// Tests
// ============================================================================
