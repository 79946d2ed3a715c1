use super::tools::{RefundKind, LIST_REASONS_TOOL, QUERY_ORDER_TOOL};
use async_trait::async_trait;
use hitl_agent_loop::{Planner, PlannerError, PlannerStep};
use hitl_contract::{Message, Role, ToolDescriptor};
use hitl_extension_escalation::EscalationPolicy;
use serde_json::{json, Value};

pub const DEFAULT_REFUND_REASON: &str = "Not specified";

const HELP: &str = "Please give an order number (e.g. ORD20260101001), a refund amount and a reason, \
    for example: \"refund ORD20260101001 300 reason: item arrived damaged\". \
    Ask for \"refund reasons\" to see the accepted reasons.";

/// Refund request fields read from one user query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefundQuery {
    pub order_id: Option<String>,
    pub refund_amount: Option<f64>,
    pub refund_reason: Option<String>,
    pub wants_reasons: bool,
}

impl RefundQuery {
    /// Parse a JSON object query or free text.
    ///
    /// Free text: the first `ORD…` token is the order, the first other number is
    /// the amount, and anything after `reason:` is the reason.
    pub fn parse(query: &str) -> Self {
        let trimmed = query.trim();
        if trimmed.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
                return Self::from_json(&map);
            }
        }
        Self::from_text(trimmed)
    }

    fn from_json(map: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let refund_amount = match map.get("refund_amount") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Self {
            order_id: text("order_id"),
            refund_amount,
            refund_reason: text("refund_reason"),
            wants_reasons: text("intent").as_deref() == Some("list_reasons"),
        }
    }

    fn from_text(query: &str) -> Self {
        let lower = query.to_ascii_lowercase();
        let (body, refund_reason) = match lower.find("reason:") {
            Some(at) => {
                let reason = query[at + "reason:".len()..].trim();
                (
                    &query[..at],
                    (!reason.is_empty()).then(|| reason.to_string()),
                )
            }
            None => (query, None),
        };

        let mut order_id = None;
        let mut refund_amount = None;
        for token in body.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            if word.len() > 3 && word.to_ascii_uppercase().starts_with("ORD") {
                if order_id.is_none() {
                    order_id = Some(word.to_ascii_uppercase());
                }
                continue;
            }
            if refund_amount.is_none() {
                let digits = token.trim_matches(|c: char| !(c.is_ascii_digit() || c == '.'));
                refund_amount = digits.parse::<f64>().ok().filter(|v| v.is_finite());
            }
        }

        Self {
            order_id,
            refund_amount,
            refund_reason,
            wants_reasons: lower.contains("reasons"),
        }
    }
}

/// Deterministic planner for the refund desk.
///
/// One tool call per query: refunds are routed to the tool matching the
/// amount's escalation tier; the run finishes with the last tool result.
#[derive(Debug, Clone, Default)]
pub struct RefundPlanner {
    policy: EscalationPolicy,
}

impl RefundPlanner {
    pub fn new(policy: EscalationPolicy) -> Self {
        Self { policy }
    }

    fn plan(&self, query: &str) -> PlannerStep {
        let parsed = RefundQuery::parse(query);
        match (parsed.order_id, parsed.refund_amount) {
            (Some(order_id), Some(amount)) => {
                let kind = RefundKind::for_tier(self.policy.tier(amount));
                PlannerStep::call(
                    kind.tool_id(),
                    json!({
                        "order_id": order_id,
                        "refund_amount": amount,
                        "refund_reason": parsed
                            .refund_reason
                            .unwrap_or_else(|| DEFAULT_REFUND_REASON.to_string()),
                    }),
                )
            }
            _ if parsed.wants_reasons => PlannerStep::call(LIST_REASONS_TOOL, json!({})),
            (Some(order_id), None) => {
                PlannerStep::call(QUERY_ORDER_TOOL, json!({ "order_id": order_id }))
            }
            (None, _) => PlannerStep::finish(HELP),
        }
    }
}

#[async_trait]
impl Planner for RefundPlanner {
    async fn next_step(
        &self,
        transcript: &[Message],
        _tools: &[ToolDescriptor],
    ) -> Result<PlannerStep, PlannerError> {
        let last_user = transcript
            .iter()
            .rposition(|m| m.role == Role::User)
            .ok_or(PlannerError::NoUserMessage)?;

        if let Some(result) = transcript[last_user + 1..]
            .iter()
            .rev()
            .find(|m| m.role == Role::Tool)
        {
            return Ok(PlannerStep::finish(result.content.trim()));
        }
        Ok(self.plan(&transcript[last_user].content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::tools::{LARGE_REFUND_TOOL, MEDIUM_REFUND_TOOL, SMALL_REFUND_TOOL};
    use hitl_contract::ToolCall;

    #[test]
    fn parses_json_queries() {
        let parsed = RefundQuery::parse(
            r#"{"order_id": "ORD20260101001", "refund_amount": "300", "refund_reason": "Wrong size"}"#,
        );
        assert_eq!(parsed.order_id.as_deref(), Some("ORD20260101001"));
        assert_eq!(parsed.refund_amount, Some(300.0));
        assert_eq!(parsed.refund_reason.as_deref(), Some("Wrong size"));
    }

    #[test]
    fn parses_free_text_queries() {
        let parsed =
            RefundQuery::parse("Please refund ord20260104005 for ¥650.50, Reason: arrived damaged");
        assert_eq!(parsed.order_id.as_deref(), Some("ORD20260104005"));
        assert_eq!(parsed.refund_amount, Some(650.5));
        assert_eq!(parsed.refund_reason.as_deref(), Some("arrived damaged"));
        assert!(!parsed.wants_reasons);

        let lookup = RefundQuery::parse("where is ORD20260102002?");
        assert_eq!(lookup.order_id.as_deref(), Some("ORD20260102002"));
        assert_eq!(lookup.refund_amount, None);

        assert!(RefundQuery::parse("what refund reasons are accepted").wants_reasons);
    }

    fn planned_tool(query: &str) -> Option<String> {
        match RefundPlanner::default().plan(query) {
            PlannerStep::CallTool { name, .. } => Some(name),
            PlannerStep::Finish(_) => None,
        }
    }

    #[test]
    fn routes_by_escalation_tier() {
        assert_eq!(
            planned_tool("refund ORD20260103003 50").as_deref(),
            Some(SMALL_REFUND_TOOL)
        );
        assert_eq!(
            planned_tool("refund ORD20260101001 300").as_deref(),
            Some(MEDIUM_REFUND_TOOL)
        );
        assert_eq!(
            planned_tool("refund ORD20260104005 501").as_deref(),
            Some(LARGE_REFUND_TOOL)
        );
        assert_eq!(
            planned_tool("show ORD20260104005").as_deref(),
            Some(QUERY_ORDER_TOOL)
        );
        assert_eq!(planned_tool("list refund reasons").as_deref(), Some(LIST_REASONS_TOOL));
        assert_eq!(planned_tool("hello"), None);
    }

    #[tokio::test]
    async fn finishes_with_last_tool_result() {
        let call = ToolCall::new("call_1", QUERY_ORDER_TOOL, json!({"order_id": "ORD1"}));
        let transcript = vec![
            Message::system("sys"),
            Message::user("show ORD1"),
            Message::assistant_tool_call(call),
            Message::tool("  Order ORD1 not found.  ", "call_1"),
        ];
        let step = RefundPlanner::default()
            .next_step(&transcript, &[])
            .await
            .unwrap();
        assert_eq!(step, PlannerStep::finish("Order ORD1 not found."));
    }

    #[tokio::test]
    async fn transcript_without_user_message_fails() {
        let err = RefundPlanner::default()
            .next_step(&[Message::system("sys")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NoUserMessage));
    }
}
