//! Refund desk: demo order catalog, refund tools, review text and planner.

pub mod catalog;
pub mod planner;
pub mod review;
pub mod tools;

use hitl_agent_loop::ToolLoopEngine;
use hitl_contract::storage::CheckpointStore;
use hitl_contract::{tool_map, Tool, ToolMap};
use hitl_extension_escalation::{ActionGateRegistry, EscalationPolicy, GatedAction};
use std::sync::Arc;

pub use planner::{RefundPlanner, RefundQuery};
pub use review::review_description;
pub use tools::{
    ListRefundReasonsTool, QueryOrderInfoTool, RefundKind, RefundTool, LARGE_REFUND_TOOL,
    LIST_REASONS_TOOL, MEDIUM_REFUND_TOOL, QUERY_ORDER_TOOL, SMALL_REFUND_TOOL,
};

/// Argument every gated refund tool is classified on.
pub const RISK_ATTRIBUTE: &str = "refund_amount";

pub fn refund_tools(policy: &EscalationPolicy) -> ToolMap {
    let tools: [Arc<dyn Tool>; 5] = [
        Arc::new(RefundTool::new(RefundKind::Large, policy.auto_max)),
        Arc::new(RefundTool::new(RefundKind::Medium, policy.auto_max)),
        Arc::new(RefundTool::new(RefundKind::Small, policy.auto_max)),
        Arc::new(QueryOrderInfoTool),
        Arc::new(ListRefundReasonsTool),
    ];
    tool_map(tools)
}

/// Large and medium refunds pause for review; the small path and lookups are exempt.
pub fn refund_gates(policy: EscalationPolicy) -> ActionGateRegistry {
    let gate = GatedAction::new(RISK_ATTRIBUTE).with_describer(review_description);
    ActionGateRegistry::new(policy)
        .with_gate(LARGE_REFUND_TOOL, gate.clone())
        .with_gate(MEDIUM_REFUND_TOOL, gate)
}

/// Tool-loop engine wired with the refund planner, tools and gates.
pub fn refund_engine(
    policy: EscalationPolicy,
    checkpoints: Arc<dyn CheckpointStore>,
) -> ToolLoopEngine {
    ToolLoopEngine::new(
        Arc::new(RefundPlanner::new(policy)),
        refund_tools(&policy),
        refund_gates(policy),
        checkpoints,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitl_contract::ToolCall;
    use hitl_extension_escalation::GateDecision;
    use serde_json::json;

    #[test]
    fn only_large_and_medium_refunds_are_gated() {
        let gates = refund_gates(EscalationPolicy::default());
        assert!(gates.is_gated(LARGE_REFUND_TOOL));
        assert!(gates.is_gated(MEDIUM_REFUND_TOOL));
        assert!(!gates.is_gated(SMALL_REFUND_TOOL));
        assert!(!gates.is_gated(QUERY_ORDER_TOOL));

        let call = ToolCall::new(
            "call_1",
            MEDIUM_REFUND_TOOL,
            json!({"order_id": "ORD20260101001", "refund_amount": 300, "refund_reason": "Wrong size"}),
        );
        let GateDecision::Suspend(interrupt) = gates.evaluate(&call) else {
            panic!("expected suspend");
        };
        assert!(interrupt.description.contains("Customer: Zhang Xiaoming"));
    }

    #[test]
    fn tool_map_covers_the_desk() {
        let tools = refund_tools(&EscalationPolicy::default());
        assert_eq!(tools.len(), 5);
        assert!(tools.contains_key(LIST_REASONS_TOOL));
    }
}
