use crate::io::Decision;
use crate::outcome::{InterruptData, Outcome};
use crate::session::SessionKey;
use crate::storage::CheckpointStoreError;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Input of a fresh run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInput {
    /// System instruction, already decorated with preferences.
    pub system: String,
    pub query: String,
}

/// What the engine returns from `run`/`resume`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// Finished; `result.messages` holds the ordered transcript.
    Completed { result: Value },
    /// Paused on a gated action.
    Interrupted(InterruptData),
}

impl From<EngineOutcome> for Outcome {
    fn from(outcome: EngineOutcome) -> Self {
        match outcome {
            EngineOutcome::Completed { result } => Outcome::Completed { result },
            EngineOutcome::Interrupted(interrupt_data) => Outcome::Interrupted { interrupt_data },
        }
    }
}

/// Engine failures; persisted as an `error` outcome by the coordinator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no pending action for session {0}")]
    NoPendingAction(String),

    #[error("step limit of {0} exceeded")]
    StepLimit(usize),

    #[error("planner failed: {0}")]
    Planner(String),

    #[error("checkpoint store failed: {0}")]
    Checkpoint(#[from] CheckpointStoreError),

    #[error("{0}")]
    Internal(String),
}

/// Decision-making engine the coordinator drives.
///
/// Implementations own their checkpoint state per `(user_id, session_id)`.
/// A `resume` call must only happen while the session's last outcome was
/// `Interrupted`.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Start a run on the session, discarding any pending action it had.
    async fn run(&self, key: &SessionKey, input: RunInput) -> Result<EngineOutcome, EngineError>;

    /// Continue a paused run with a human decision.
    async fn resume(
        &self,
        key: &SessionKey,
        decision: Decision,
    ) -> Result<EngineOutcome, EngineError>;

    /// Drop any state kept for the session.
    async fn discard(&self, _key: &SessionKey) -> Result<(), EngineError> {
        Ok(())
    }
}
