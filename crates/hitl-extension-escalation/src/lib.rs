//! Tiered escalation for gated actions.
//!
//! - [`EscalationPolicy`] maps a monetary risk attribute to an approval tier
//!   and the capabilities a reviewer may exercise.
//! - [`ActionGateRegistry`] declares which actions are gated and turns a
//!   proposed call into [`GateDecision::Proceed`] or a suspend payload.
//!
//! # Example
//!
//! ```ignore
//! let gates = ActionGateRegistry::new(EscalationPolicy::default())
//!     .with_gate("process_medium_refund", GatedAction::new("refund_amount"));
//!
//! match gates.evaluate(&call) {
//!     GateDecision::Proceed => { /* execute */ }
//!     GateDecision::Suspend(interrupt) => { /* park the call */ }
//! }
//! ```

mod gate;
mod policy;

pub use gate::{risk_amount, ActionGateRegistry, Describer, GateDecision, GatedAction};
pub use policy::{Classification, EscalationPolicy, EscalationTier, PolicyError};
