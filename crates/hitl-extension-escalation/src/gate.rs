use crate::policy::{Classification, EscalationPolicy, EscalationTier};
use hitl_contract::{InterruptConfig, InterruptData, ToolCall};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Renders the reviewer-facing description of a suspended call.
pub type Describer = Arc<dyn Fn(&ToolCall, &Classification) -> String + Send + Sync>;

/// Gate verdict for one proposed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Execute without pausing.
    Proceed,
    /// Pause and surface the payload to a human.
    Suspend(InterruptData),
}

/// Registration of one gated action.
#[derive(Clone)]
pub struct GatedAction {
    risk_attribute: String,
    capabilities: Option<InterruptConfig>,
    describer: Describer,
}

impl fmt::Debug for GatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatedAction")
            .field("risk_attribute", &self.risk_attribute)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl GatedAction {
    /// Gate keyed on the numeric argument `risk_attribute`.
    pub fn new(risk_attribute: impl Into<String>) -> Self {
        Self {
            risk_attribute: risk_attribute.into(),
            capabilities: None,
            describer: Arc::new(default_description),
        }
    }

    /// Fixed capability set for this action, replacing the tier's.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: InterruptConfig) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    #[must_use]
    pub fn with_describer<F>(mut self, describer: F) -> Self
    where
        F: Fn(&ToolCall, &Classification) -> String + Send + Sync + 'static,
    {
        self.describer = Arc::new(describer);
        self
    }

    pub fn risk_attribute(&self) -> &str {
        &self.risk_attribute
    }
}

/// Declares which actions need a human decision.
///
/// Actions absent from the registry are exempt and always proceed.
#[derive(Debug, Clone, Default)]
pub struct ActionGateRegistry {
    policy: EscalationPolicy,
    gates: HashMap<String, GatedAction>,
}

impl ActionGateRegistry {
    pub fn new(policy: EscalationPolicy) -> Self {
        Self {
            policy,
            gates: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_gate(mut self, action: impl Into<String>, gate: GatedAction) -> Self {
        self.register(action, gate);
        self
    }

    pub fn register(&mut self, action: impl Into<String>, gate: GatedAction) {
        self.gates.insert(action.into(), gate);
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    pub fn is_gated(&self, action: &str) -> bool {
        self.gates.contains_key(action)
    }

    /// Decide whether `call` may execute or must pause.
    ///
    /// A gated call whose risk attribute is missing or non-numeric is
    /// classified as supervisor tier.
    pub fn evaluate(&self, call: &ToolCall) -> GateDecision {
        let Some(gate) = self.gates.get(&call.name) else {
            return GateDecision::Proceed;
        };

        let classification = match risk_amount(&call.arguments, &gate.risk_attribute) {
            Some(amount) => self.policy.classify(amount),
            None => {
                tracing::warn!(
                    action = %call.name,
                    attribute = %gate.risk_attribute,
                    "gated call lacks a numeric risk attribute, escalating to supervisor"
                );
                Classification {
                    tier: EscalationTier::Supervisor,
                    capabilities: self.policy.capabilities(EscalationTier::Supervisor),
                }
            }
        };

        let Some(tier_capabilities) = classification.capabilities else {
            return GateDecision::Proceed;
        };
        let capabilities = gate.capabilities.unwrap_or(tier_capabilities);
        let description = (gate.describer)(call, &classification);
        tracing::info!(
            action = %call.name,
            tier = %classification.tier,
            "gated call suspended for human review"
        );
        GateDecision::Suspend(InterruptData::new(
            call.name.clone(),
            call.arguments.clone(),
            capabilities,
            description,
        ))
    }
}

/// Numeric value of `attribute` in `args`; numeric strings are accepted.
pub fn risk_amount(args: &Value, attribute: &str) -> Option<f64> {
    match args.get(attribute)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn default_description(call: &ToolCall, classification: &Classification) -> String {
    format!(
        "Action '{}' requires {} approval.\nArguments: {}",
        call.name, classification.tier, call.arguments
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ActionGateRegistry {
        ActionGateRegistry::new(EscalationPolicy::default())
            .with_gate("refund", GatedAction::new("amount"))
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new("call_1", name, args)
    }

    #[test]
    fn exempt_action_proceeds() {
        assert_eq!(
            registry().evaluate(&call("lookup", json!({"amount": 9999}))),
            GateDecision::Proceed
        );
    }

    #[test]
    fn auto_tier_amount_proceeds() {
        assert_eq!(
            registry().evaluate(&call("refund", json!({"amount": 100}))),
            GateDecision::Proceed
        );
    }

    #[test]
    fn review_tier_suspends_with_verbatim_args() {
        let args = json!({"amount": 300, "order_id": "ORD1", "reason": "broken"});
        let GateDecision::Suspend(data) = registry().evaluate(&call("refund", args.clone())) else {
            panic!("expected suspend");
        };
        assert_eq!(data.action_request.action, "refund");
        assert_eq!(data.action_request.args, args);
        assert_eq!(data.config, InterruptConfig::reviewer());
        assert!(data.description.contains("review"));
    }

    #[test]
    fn missing_amount_escalates_to_supervisor() {
        let GateDecision::Suspend(data) = registry().evaluate(&call("refund", json!({}))) else {
            panic!("expected suspend");
        };
        assert!(data.description.contains("supervisor"));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        assert_eq!(risk_amount(&json!({"amount": " 42.5 "}), "amount"), Some(42.5));
        assert_eq!(risk_amount(&json!({"amount": "abc"}), "amount"), None);
        assert_eq!(risk_amount(&json!({"amount": true}), "amount"), None);
    }

    #[test]
    fn gate_overrides_capabilities_and_description() {
        let locked = InterruptConfig {
            allow_ignore: false,
            allow_respond: false,
            allow_edit: false,
            allow_accept: true,
        };
        let registry = ActionGateRegistry::new(EscalationPolicy::default()).with_gate(
            "wire",
            GatedAction::new("amount")
                .with_capabilities(locked)
                .with_describer(|call, c| format!("{} at {}", call.name, c.tier)),
        );
        let GateDecision::Suspend(data) = registry.evaluate(&call("wire", json!({"amount": 800})))
        else {
            panic!("expected suspend");
        };
        assert_eq!(data.config, locked);
        assert_eq!(data.description, "wire at supervisor");
    }
}
