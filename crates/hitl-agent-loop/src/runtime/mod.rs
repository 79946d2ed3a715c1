mod loop_runner;
mod planner;

pub use loop_runner::{ToolLoopEngine, DEFAULT_MAX_STEPS};
pub use planner::{Planner, PlannerError, PlannerStep};

#[cfg(test)]
mod tests;
