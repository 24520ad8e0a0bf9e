//! Simulation engine: owns the parameters, the time accounting and the
//! per-tick pipeline, and composes the kinematic model, track map and lap
//! detector into one steppable simulation.

mod engine;
mod params;
mod start_line;

pub use engine::{SimulationEngine, StepError, StepSnapshot, TrackInfo};
pub use params::{SimParams, SimParamsUpdate};
pub use start_line::{FallbackStartLine, StartPlacement, derive_from_connections};
