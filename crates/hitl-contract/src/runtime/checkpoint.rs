use crate::io::PendingActionStatus;
use crate::outcome::InterruptData;
use crate::thread::{Message, ToolCall};
use serde::{Deserialize, Serialize};

/// Gated tool call parked until a decision arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub call: ToolCall,
    pub interrupt: InterruptData,
    pub status: PendingActionStatus,
}

impl PendingAction {
    pub fn awaiting(call: ToolCall, interrupt: InterruptData) -> Self {
        Self {
            call,
            interrupt,
            status: PendingActionStatus::AwaitingDecision,
        }
    }
}

/// Engine replay state for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub messages: Vec<Message>,
    /// At most one per session.
    #[serde(default)]
    pub pending: Option<PendingAction>,
}
