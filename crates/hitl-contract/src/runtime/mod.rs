//! Engine-facing runtime contracts.

pub mod checkpoint;
pub mod engine;

pub use checkpoint::{Checkpoint, PendingAction};
pub use engine::{DecisionEngine, EngineError, EngineOutcome, RunInput};
