use crate::outcome::InterruptConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Human decision injected into a paused session.
///
/// Closed set: any other decision type fails to parse before state is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Execute the proposed action verbatim.
    Accept,
    /// Execute with replacement parameters.
    Edit { args: Value },
    /// Do not execute.
    Reject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Do not execute; the text becomes the action's result.
    Response { args: String },
}

/// Decision payload errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unsupported decision type: {0}")]
    UnsupportedDecision(String),

    #[error("decision '{0}' requires args")]
    MissingArgs(&'static str),

    #[error("decision '{kind}' has invalid args: {message}")]
    InvalidArgs { kind: &'static str, message: String },
}

impl Decision {
    /// Build a decision from the loose `{response_type, args, reason}` wire triple.
    ///
    /// `args` may be wrapped as `{"args": ...}`, the shape interactive clients send.
    pub fn from_parts(
        response_type: &str,
        args: Option<Value>,
        reason: Option<String>,
    ) -> Result<Self, ProtocolError> {
        let args = args.map(unwrap_args);
        match response_type {
            "accept" => Ok(Self::Accept),
            "edit" => match args {
                Some(Value::Object(map)) => Ok(Self::Edit {
                    args: Value::Object(map),
                }),
                Some(other) => Err(ProtocolError::InvalidArgs {
                    kind: "edit",
                    message: format!("expected an object, got {other}"),
                }),
                None => Err(ProtocolError::MissingArgs("edit")),
            },
            "reject" => {
                let reason = reason.or_else(|| {
                    args.as_ref()
                        .and_then(|a| a.get("reason"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
                Ok(Self::Reject { reason })
            }
            "response" => match args {
                Some(Value::String(text)) => Ok(Self::Response { args: text }),
                Some(Value::Null) | None => Err(ProtocolError::MissingArgs("response")),
                Some(other) => Ok(Self::Response {
                    args: other.to_string(),
                }),
            },
            other => Err(ProtocolError::UnsupportedDecision(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Edit { .. } => "edit",
            Self::Reject { .. } => "reject",
            Self::Response { .. } => "response",
        }
    }

    /// Whether the pause point's capability set admits this decision.
    ///
    /// `reject` is always admitted.
    pub fn permitted_by(&self, config: &InterruptConfig) -> bool {
        match self {
            Self::Accept => config.allow_accept,
            Self::Edit { .. } => config.allow_edit,
            Self::Response { .. } => config.allow_respond,
            Self::Reject { .. } => true,
        }
    }

    /// Whether the decision leads to executing the gated action.
    pub fn executes(&self) -> bool {
        matches!(self, Self::Accept | Self::Edit { .. })
    }
}

fn unwrap_args(args: Value) -> Value {
    match args {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("args") => {
            map.remove("args").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Per pending action lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingActionStatus {
    Proposed,
    AwaitingDecision,
    Accepted,
    Edited,
    Rejected,
    Responded,
}

impl PendingActionStatus {
    pub const ASCII_STATE_MACHINE: &str = r#"proposed -> awaiting_decision
awaiting_decision -> accepted
awaiting_decision -> edited
awaiting_decision -> rejected
awaiting_decision -> responded"#;

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Edited | Self::Rejected | Self::Responded
        )
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Proposed => next == Self::AwaitingDecision,
            Self::AwaitingDecision => next.is_terminal(),
            _ => false,
        }
    }

    /// Terminal status reached by applying `decision`.
    pub fn resolved_by(decision: &Decision) -> Self {
        match decision {
            Decision::Accept => Self::Accepted,
            Decision::Edit { .. } => Self::Edited,
            Decision::Reject { .. } => Self::Rejected,
            Decision::Response { .. } => Self::Responded,
        }
    }
}
