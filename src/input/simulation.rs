//! Window simulation for demos and testing.
//!
//! Drives the input entities of configured windows through a fixed cycle so
//! status changes can be observed without real sensors.

use crate::host::StateRegistry;
use crate::status::{BinaryReading, Mode, WindowStatus};
use crate::window::ExtendedWindowSensor;
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Step of the simulated cycle: Closed, Tilted, Open, and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Closed,
    Tilted,
    Open,
}

impl SimulationPhase {
    pub fn next(self) -> Self {
        match self {
            SimulationPhase::Closed => SimulationPhase::Tilted,
            SimulationPhase::Tilted => SimulationPhase::Open,
            SimulationPhase::Open => SimulationPhase::Closed,
        }
    }

    /// Status a window should report while in this phase.
    pub fn expected_status(self) -> WindowStatus {
        match self {
            SimulationPhase::Closed => WindowStatus::Closed,
            SimulationPhase::Tilted => WindowStatus::Tilted,
            SimulationPhase::Open => WindowStatus::Open,
        }
    }

    /// Input states producing this phase for a window in `mode`.
    ///
    /// Returns `(primary, secondary)` host state strings.
    pub fn input_states(self, mode: &Mode) -> (&'static str, String) {
        let primary = BinaryReading::from(self != SimulationPhase::Closed).to_state();
        let secondary = match (mode, self) {
            (Mode::RotaryValue { .. }, SimulationPhase::Closed) => "0".to_string(),
            (Mode::RotaryValue { threshold }, SimulationPhase::Tilted) => {
                // Half the threshold, or just below it when the threshold is 0
                let angle = if threshold.value() > 0.0 {
                    threshold.value() / 2.0
                } else {
                    -1.0
                };
                angle.to_string()
            }
            (Mode::RotaryValue { threshold }, SimulationPhase::Open) => {
                (threshold.value() + 10.0).to_string()
            }
            (Mode::DualSensor, phase) => BinaryReading::from(phase == SimulationPhase::Open)
                .to_state()
                .to_string(),
        };
        (primary, secondary)
    }
}

/// Write the input states of every window for `phase`.
pub fn apply_phase(
    states: &StateRegistry,
    windows: &[Arc<ExtendedWindowSensor>],
    phase: SimulationPhase,
) {
    for window in windows {
        let (primary, secondary) = phase.input_states(&window.mode());
        // Secondary first, so the primary change triggers the final evaluation
        states.set(window.second_entity(), secondary);
        states.set(window.base_entity(), primary);
    }
}

/// Spawn a task that steps all windows through the simulated cycle.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_window_simulation(
    states: Arc<StateRegistry>,
    windows: Vec<Arc<ExtendedWindowSensor>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        let mut phase = SimulationPhase::Closed;
        loop {
            ticker.tick().await;
            apply_phase(&states, &windows, phase);
            info!(
                "[Sim] {} window(s) moved to {:?}",
                windows.len(),
                phase
            );
            phase = phase.next();
        }
    })
}
