//! Turning a human decision on a pending action into the action's result.

use super::tool_execution::execute_call;
use crate::contracts::tool::ToolMap;
use crate::contracts::{Decision, PendingAction, PendingActionStatus, ToolCall};

/// Text used when a rejection carries no reason.
pub const NO_REASON_PROVIDED: &str = "no reason provided";

/// Synthesized result of a resolved pending action.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: PendingActionStatus,
    /// The call as executed; `None` when nothing ran.
    pub executed: Option<ToolCall>,
    /// Value handed back to the engine as the action's result.
    pub content: String,
}

/// Apply `decision` to `pending`.
///
/// `accept` runs the proposed call verbatim and `edit` runs it with the
/// replacement args. Execution failures are folded into `content`, never
/// returned as errors. `reject` and `response` run nothing.
pub async fn resolve_decision(
    pending: &PendingAction,
    decision: Decision,
    tools: &ToolMap,
) -> Resolution {
    let status = PendingActionStatus::resolved_by(&decision);
    let action = pending.call.name.as_str();
    match decision {
        Decision::Accept => run(pending.call.clone(), status, tools).await,
        Decision::Edit { args } => {
            let call = ToolCall::new(pending.call.id.clone(), pending.call.name.clone(), args);
            run(call, status, tools).await
        }
        Decision::Reject { reason } => {
            let reason = reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| NO_REASON_PROVIDED.to_string());
            Resolution {
                status,
                executed: None,
                content: format!("Request '{action}' was rejected. Reason: {reason}"),
            }
        }
        Decision::Response { args } => Resolution {
            status,
            executed: None,
            content: args,
        },
    }
}

async fn run(call: ToolCall, status: PendingActionStatus, tools: &ToolMap) -> Resolution {
    let execution = execute_call(tools, &call).await;
    let content = if execution.result.is_success() {
        execution.result.to_text()
    } else {
        format!("{} failed: {}", call.name, execution.result.to_text())
    };
    Resolution {
        status,
        executed: Some(call),
        content,
    }
}
