use super::catalog;
use hitl_contract::ToolCall;
use hitl_extension_escalation::Classification;
use serde_json::Value;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

const DECISION_MENU: &str = "Approve this refund?\n\
    Enter 'yes' to approve the refund\n\
    Enter 'no' to reject the refund\n\
    Enter 'edit' to change the refund amount\n\
    Enter 'response' to reply with handling guidance";

/// Reviewer-facing text for a suspended refund call.
pub fn review_description(call: &ToolCall, classification: &Classification) -> String {
    let args = &call.arguments;
    let order_id = args.get("order_id").and_then(Value::as_str).unwrap_or("");
    let amount = display_amount(args.get("refund_amount"));
    let reason = args
        .get("refund_reason")
        .and_then(Value::as_str)
        .unwrap_or("N/A");

    match catalog::find_order(order_id) {
        Some(order) => format!(
            "[Refund review: {tier}]\n{RULE}\n\
             Order: {}\n\
             Customer: {}\n\
             Product: {}\n\
             Order amount: ¥{:.2}\n\
             Refund amount: ¥{amount}\n\
             Reason: {reason}\n\
             Order status: {}\n{RULE}\n\n{DECISION_MENU}",
            order.order_id,
            order.customer_name,
            order.product_name,
            order.order_amount,
            order.order_status,
            tier = classification.tier,
        ),
        None => format!(
            "[Refund review: {tier}]\n\
             Order: {order_id}\n\
             Refund amount: ¥{amount}\n\
             Reason: {reason}\n\n\
             Warning: order information not found\n\n{DECISION_MENU}",
            tier = classification.tier,
        ),
    }
}

fn display_amount(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| n.to_string()),
        Some(Value::String(s)) => s.clone(),
        _ => "0".to_string(),
    }
}
