use crate::contracts::{Message, ToolDescriptor};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Next move chosen by a planner.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerStep {
    /// Propose a tool call.
    CallTool { name: String, arguments: Value },
    /// Finish the run with a final assistant answer.
    Finish(String),
}

impl PlannerStep {
    pub fn call(name: impl Into<String>, arguments: Value) -> Self {
        Self::CallTool {
            name: name.into(),
            arguments,
        }
    }

    pub fn finish(answer: impl Into<String>) -> Self {
        Self::Finish(answer.into())
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner backend failed: {0}")]
    Backend(String),

    #[error("transcript has no user message")]
    NoUserMessage,
}

/// Reasoning seam of the engine: reads the transcript, picks the next step.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn next_step(
        &self,
        transcript: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<PlannerStep, PlannerError>;
}
