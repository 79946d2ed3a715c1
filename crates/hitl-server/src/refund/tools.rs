use super::catalog::{self, Order, REFUND_REASONS};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use hitl_contract::{ToolError, ToolResult, TypedTool};
use hitl_extension_escalation::EscalationTier;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

pub const LARGE_REFUND_TOOL: &str = "process_large_refund";
pub const MEDIUM_REFUND_TOOL: &str = "process_medium_refund";
pub const SMALL_REFUND_TOOL: &str = "process_small_refund";
pub const QUERY_ORDER_TOOL: &str = "query_order_info";
pub const LIST_REASONS_TOOL: &str = "list_refund_reasons";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Refund processing path, one per escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundKind {
    Large,
    Medium,
    Small,
}

impl RefundKind {
    pub fn for_tier(tier: EscalationTier) -> Self {
        match tier {
            EscalationTier::Auto => Self::Small,
            EscalationTier::Review => Self::Medium,
            EscalationTier::Supervisor => Self::Large,
        }
    }

    pub fn tool_id(self) -> &'static str {
        match self {
            Self::Large => LARGE_REFUND_TOOL,
            Self::Medium => MEDIUM_REFUND_TOOL,
            Self::Small => SMALL_REFUND_TOOL,
        }
    }

    fn approval_level(self) -> &'static str {
        match self {
            Self::Large => "supervisor review",
            Self::Medium => "customer service review",
            Self::Small => "auto-approved",
        }
    }

    /// Large: 3-5 days, medium: 1-3 days, small: 12-24 hours.
    fn estimated_arrival(self, now: DateTime<Local>, rng: &mut impl Rng) -> String {
        match self {
            Self::Large => (now + Duration::days(rng.gen_range(3..=5)))
                .format("%Y-%m-%d")
                .to_string(),
            Self::Medium => (now + Duration::days(rng.gen_range(1..=3)))
                .format("%Y-%m-%d")
                .to_string(),
            Self::Small => (now + Duration::hours(rng.gen_range(12..=24)))
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RefundArgs {
    /// Order number, e.g. ORD20260101001.
    pub order_id: String,
    /// Amount to refund.
    pub refund_amount: f64,
    /// Why the customer wants a refund.
    pub refund_reason: String,
}

/// Submits a refund for one order.
#[derive(Debug, Clone)]
pub struct RefundTool {
    kind: RefundKind,
    /// Upper bound enforced by the small-refund path.
    auto_max: f64,
}

impl RefundTool {
    pub fn new(kind: RefundKind, auto_max: f64) -> Self {
        Self { kind, auto_max }
    }
}

#[async_trait]
impl TypedTool for RefundTool {
    type Args = RefundArgs;

    fn tool_id(&self) -> &str {
        self.kind.tool_id()
    }

    fn name(&self) -> &str {
        match self.kind {
            RefundKind::Large => "Process large refund",
            RefundKind::Medium => "Process medium refund",
            RefundKind::Small => "Process small refund",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            RefundKind::Large => "Process a large refund (above the review limit, supervisor approval)",
            RefundKind::Medium => "Process a medium refund (above the auto limit, customer service approval)",
            RefundKind::Small => "Process a small refund (within the auto limit, approved automatically)",
        }
    }

    fn validate(&self, args: &RefundArgs) -> Result<(), String> {
        if !args.refund_amount.is_finite() || args.refund_amount <= 0.0 {
            return Err(format!(
                "refund_amount must be positive, got {}",
                args.refund_amount
            ));
        }
        if self.kind == RefundKind::Small && args.refund_amount > self.auto_max {
            return Err(format!(
                "refund_amount {} exceeds the automatic approval limit {}",
                args.refund_amount, self.auto_max
            ));
        }
        Ok(())
    }

    async fn execute(&self, args: RefundArgs) -> Result<ToolResult, ToolError> {
        let tool_id = self.kind.tool_id();
        let Some(order) = catalog::find_order(&args.order_id) else {
            return Ok(ToolResult::warning(
                tool_id,
                format!("Error: order {} does not exist", args.order_id),
            ));
        };
        let receipt = issue_receipt(self.kind, order, &args, Local::now());
        tracing::info!(
            tool = tool_id,
            order_id = order.order_id,
            refund_number = %receipt.refund_number,
            amount = args.refund_amount,
            "refund processed"
        );
        Ok(ToolResult::success_with_message(
            tool_id,
            json!({
                "refund_number": receipt.refund_number,
                "order_id": order.order_id,
                "refund_amount": args.refund_amount,
                "approval_level": self.kind.approval_level(),
                "estimated_arrival": receipt.estimated_arrival,
            }),
            receipt.text,
        ))
    }
}

struct Receipt {
    refund_number: String,
    estimated_arrival: String,
    text: String,
}

fn issue_receipt(kind: RefundKind, order: &Order, args: &RefundArgs, now: DateTime<Local>) -> Receipt {
    let mut rng = rand::thread_rng();
    let refund_number = format!(
        "REF{}{}",
        now.format("%Y%m%d%H%M%S"),
        rng.gen_range(1000..=9999)
    );
    let estimated_arrival = kind.estimated_arrival(now, &mut rng);
    let text = format!(
        "Refund processed successfully\n{RULE}\n\
         Refund number: {refund_number}\n\
         Order: {}\n\
         Customer: {}\n\
         Product: {}\n\
         Order amount: ¥{:.2}\n\
         Refund amount: ¥{:.2}\n\
         Reason: {}\n\
         Approval level: {}\n\
         Processed at: {}\n\
         Estimated arrival: {estimated_arrival}\n{RULE}",
        order.order_id,
        order.customer_name,
        order.product_name,
        order.order_amount,
        args.refund_amount,
        args.refund_reason,
        kind.approval_level(),
        now.format("%Y-%m-%d %H:%M:%S"),
    );
    Receipt {
        refund_number,
        estimated_arrival,
        text,
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryOrderArgs {
    /// Order number to look up.
    pub order_id: String,
}

pub struct QueryOrderInfoTool;

#[async_trait]
impl TypedTool for QueryOrderInfoTool {
    type Args = QueryOrderArgs;

    fn tool_id(&self) -> &str {
        QUERY_ORDER_TOOL
    }

    fn name(&self) -> &str {
        "Query order info"
    }

    fn description(&self) -> &str {
        "Look up an order's customer, product, amount and shipping status"
    }

    async fn execute(&self, args: QueryOrderArgs) -> Result<ToolResult, ToolError> {
        let Some(order) = catalog::find_order(&args.order_id) else {
            let available: Vec<_> = catalog::order_ids().collect();
            return Ok(ToolResult::warning(
                QUERY_ORDER_TOOL,
                format!(
                    "Order {} not found. Available orders: {}",
                    args.order_id,
                    available.join(", ")
                ),
            ));
        };
        let text = format!(
            "Order details\n{RULE}\n\
             Order: {}\n\
             Customer: {}\n\
             Product: {}\n\
             Order amount: ¥{:.2}\n\
             Order status: {}\n\
             Ordered at: {}\n\
             Shipping address: {}\n\
             Tracking: {}\n\
             Estimated delivery: {}\n{RULE}",
            order.order_id,
            order.customer_name,
            order.product_name,
            order.order_amount,
            order.order_status,
            order.order_time,
            order.shipping_address,
            order.tracking_status,
            order.estimated_delivery,
        );
        let data = serde_json::to_value(order).map_err(|e| ToolError::Internal(e.to_string()))?;
        Ok(ToolResult::success_with_message(QUERY_ORDER_TOOL, data, text))
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListReasonsArgs {}

pub struct ListRefundReasonsTool;

#[async_trait]
impl TypedTool for ListRefundReasonsTool {
    type Args = ListReasonsArgs;

    fn tool_id(&self) -> &str {
        LIST_REASONS_TOOL
    }

    fn name(&self) -> &str {
        "List refund reasons"
    }

    fn description(&self) -> &str {
        "List the accepted refund reasons"
    }

    async fn execute(&self, _args: ListReasonsArgs) -> Result<ToolResult, ToolError> {
        let lines: Vec<String> = REFUND_REASONS
            .iter()
            .enumerate()
            .map(|(i, reason)| format!("{}. {reason}", i + 1))
            .collect();
        Ok(ToolResult::success_with_message(
            LIST_REASONS_TOOL,
            json!(REFUND_REASONS),
            format!("Accepted refund reasons:\n{}", lines.join("\n")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitl_contract::{Tool, ToolStatus};
    use std::sync::Arc;

    fn refund_args(order_id: &str, amount: f64) -> serde_json::Value {
        json!({"order_id": order_id, "refund_amount": amount, "refund_reason": "Item arrived damaged"})
    }

    #[tokio::test]
    async fn refund_issues_number_and_receipt() {
        let tool: Arc<dyn Tool> = Arc::new(RefundTool::new(RefundKind::Medium, 100.0));
        let result = tool
            .execute(refund_args("ORD20260101001", 300.0))
            .await
            .unwrap();

        assert_eq!(result.status, ToolStatus::Success);
        let number = result.data["refund_number"].as_str().unwrap();
        assert!(number.starts_with("REF"));
        assert_eq!(number.len(), 3 + 14 + 4);
        let text = result.to_text();
        assert!(text.contains("Refund amount: ¥300.00"));
        assert!(text.contains("customer service review"));
    }

    #[tokio::test]
    async fn unknown_order_is_a_warning_not_an_error() {
        let tool = RefundTool::new(RefundKind::Large, 100.0);
        let result = Tool::execute(&tool, refund_args("ORD404", 900.0)).await.unwrap();
        assert_eq!(result.status, ToolStatus::Warning);
        assert_eq!(result.to_text(), "Error: order ORD404 does not exist");
    }

    #[tokio::test]
    async fn small_refund_enforces_auto_limit() {
        let tool = RefundTool::new(RefundKind::Small, 100.0);
        let err = Tool::execute(&tool, refund_args("ORD20260103003", 150.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("limit")));

        let ok = Tool::execute(&tool, refund_args("ORD20260103003", 50.0))
            .await
            .unwrap();
        assert!(ok.to_text().contains("auto-approved"));
    }

    #[tokio::test]
    async fn query_lists_available_orders_on_miss() {
        let result = Tool::execute(&QueryOrderInfoTool, json!({"order_id": "ORD1"}))
            .await
            .unwrap();
        assert_eq!(result.status, ToolStatus::Warning);
        assert!(result.to_text().contains("ORD20260104005"));

        let found = Tool::execute(&QueryOrderInfoTool, json!({"order_id": "ORD20260102002"}))
            .await
            .unwrap();
        assert_eq!(found.data["customer_name"], json!("Li Meihua"));
    }

    #[tokio::test]
    async fn reasons_are_numbered() {
        let result = Tool::execute(&ListRefundReasonsTool, json!({})).await.unwrap();
        assert!(result.to_text().contains("8. Price dropped"));
    }

    #[test]
    fn tiers_route_to_tools() {
        assert_eq!(RefundKind::for_tier(EscalationTier::Auto).tool_id(), SMALL_REFUND_TOOL);
        assert_eq!(RefundKind::for_tier(EscalationTier::Review).tool_id(), MEDIUM_REFUND_TOOL);
        assert_eq!(
            RefundKind::for_tier(EscalationTier::Supervisor).tool_id(),
            LARGE_REFUND_TOOL
        );
    }
}
