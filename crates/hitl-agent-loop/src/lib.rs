//! Core loop crate: a tool-using engine that parks gated calls for a human decision.
#![allow(missing_docs)]

pub use hitl_contract as contracts;
pub mod engine;
pub mod runtime;

pub use engine::protocol::{resolve_decision, Resolution};
pub use runtime::{Planner, PlannerError, PlannerStep, ToolLoopEngine, DEFAULT_MAX_STEPS};
