//! Input sources that feed entity states into the host.
//!
//! Current input sources:
//! - `simulation`: cycles configured windows through Closed, Tilted and Open

pub mod simulation;

pub use simulation::{SimulationPhase, run_window_simulation};
