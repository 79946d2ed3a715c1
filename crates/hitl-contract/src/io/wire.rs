//! JSON bodies exchanged over the HTTP surface.

use crate::io::decision::{Decision, ProtocolError};
use crate::outcome::AgentResponse;
use crate::session::{Session, SessionStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub user_id: String,
    pub session_id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub user_id: String,
    pub session_id: String,
    pub response_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ResumeRequest {
    /// Wire triple for `decision`.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        decision: &Decision,
    ) -> Self {
        let (args, reason) = match decision {
            Decision::Accept => (None, None),
            Decision::Edit { args } => (Some(args.clone()), None),
            Decision::Reject { reason } => (None, reason.clone()),
            Decision::Response { args } => (Some(Value::String(args.clone())), None),
        };
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            response_type: decision.kind().to_string(),
            args,
            reason,
        }
    }

    pub fn decision(&self) -> Result<Decision, ProtocolError> {
        Decision::from_parts(&self.response_type, self.args.clone(), self.reason.clone())
    }
}

/// Status projection of a session record.
///
/// A missing record serializes as `{"status": "not_found", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionStatusView {
    Found(SessionRecordView),
    NotFound(NotFoundView),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecordView {
    pub user_id: String,
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub last_query: Option<String>,
    pub last_updated: u64,
    #[serde(default)]
    pub last_response: Option<AgentResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFoundView {
    pub user_id: String,
    pub session_id: String,
    /// Always `"not_found"`.
    pub status: String,
    pub message: String,
}

impl SessionStatusView {
    pub fn not_found(user_id: &str, session_id: &str) -> Self {
        Self::NotFound(NotFoundView {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            status: "not_found".to_string(),
            message: format!("session {session_id} of user {user_id} does not exist"),
        })
    }

    /// Status, or `None` for a missing record.
    pub fn status(&self) -> Option<SessionStatus> {
        match self {
            Self::Found(record) => Some(record.status),
            Self::NotFound(_) => None,
        }
    }
}

impl From<Session> for SessionStatusView {
    fn from(session: Session) -> Self {
        Self::Found(SessionRecordView {
            user_id: session.user_id,
            session_id: session.session_id,
            status: session.status,
            last_query: session.last_query,
            last_updated: session.last_updated,
            last_response: session.last_response,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSessionView {
    /// Empty when the user is unknown.
    pub active_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListView {
    pub session_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub sessions_count: usize,
    pub active_users: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceWriteRequest {
    pub user_id: String,
    pub memory_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceWriteResponse {
    pub status: String,
    pub memory_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceReadResponse {
    pub user_id: String,
    pub long_term_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn status_view_roundtrips_both_shapes() {
        let found: SessionStatusView = Session::idle("u1", "s1", Duration::from_secs(10)).into();
        let value = serde_json::to_value(&found).unwrap();
        assert_eq!(value["status"], json!("idle"));
        let parsed: SessionStatusView = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.status(), Some(SessionStatus::Idle));

        let missing = SessionStatusView::not_found("u1", "s2");
        let value = serde_json::to_value(&missing).unwrap();
        assert_eq!(value["status"], json!("not_found"));
        let parsed: SessionStatusView = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.status(), None);
    }

    #[test]
    fn resume_request_carries_every_decision_back() {
        for decision in [
            Decision::Accept,
            Decision::Edit {
                args: json!({"refund_amount": 120}),
            },
            Decision::Reject {
                reason: Some("duplicate".into()),
            },
            Decision::Response {
                args: "call the customer".into(),
            },
        ] {
            let request = ResumeRequest::new("u1", "s1", &decision);
            assert_eq!(request.decision().unwrap(), decision);
        }
    }
}
