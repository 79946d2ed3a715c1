//! Engine outcomes as persisted in `last_response` and returned to callers.

use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Proposed action awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Gated action name (tool id).
    pub action: String,
    /// Proposed parameters, echoed verbatim.
    pub args: Value,
}

/// Capabilities a reviewer may exercise at a pause point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptConfig {
    pub allow_ignore: bool,
    pub allow_respond: bool,
    pub allow_edit: bool,
    pub allow_accept: bool,
}

impl InterruptConfig {
    /// Accept, edit and respond allowed; ignore disallowed.
    pub const fn reviewer() -> Self {
        Self {
            allow_ignore: false,
            allow_respond: true,
            allow_edit: true,
            allow_accept: true,
        }
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self::reviewer()
    }
}

/// Payload surfaced to the caller when execution pauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptData {
    pub action_request: ActionRequest,
    pub config: InterruptConfig,
    /// Human-readable review text.
    pub description: String,
}

impl InterruptData {
    pub fn new(
        action: impl Into<String>,
        args: Value,
        config: InterruptConfig,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_request: ActionRequest {
                action: action.into(),
                args,
            },
            config,
            description: description.into(),
        }
    }
}

/// Terminal result of one invoke/resume cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Paused on a gated action.
    Interrupted { interrupt_data: InterruptData },
    /// Finished; `result.messages` holds the ordered transcript.
    Completed { result: Value },
    /// Engine failure, persisted and returned as a normal response.
    Error { message: String },
}

impl Outcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Interrupted { .. } => SessionStatus::Interrupted,
            Self::Completed { .. } => SessionStatus::Completed,
            Self::Error { .. } => SessionStatus::Error,
        }
    }
}

/// Outcome tagged with the session it belongs to.
///
/// Serializes flat: `{session_id, status, interrupt_data?, result?, message?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AgentResponse {
    pub fn new(session_id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            session_id: session_id.into(),
            outcome,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.outcome.status()
    }

    pub fn interrupt_data(&self) -> Option<&InterruptData> {
        match &self.outcome {
            Outcome::Interrupted { interrupt_data } => Some(interrupt_data),
            _ => None,
        }
    }

    /// Content of the last transcript message of a completed result.
    pub fn final_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Completed { result } => result
                .get("messages")
                .and_then(Value::as_array)
                .and_then(|messages| messages.last())
                .and_then(|message| message.get("content"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}
