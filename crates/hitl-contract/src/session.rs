//! Session record and its coarse status machine.

use crate::outcome::AgentResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Coarse session status persisted with every session record.
///
/// Absence of a record is the implicit `not_found` state and is never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, no query processed yet.
    Idle,
    /// An invoke or resume is executing.
    Running,
    /// Paused on a gated action, waiting for a human decision.
    Interrupted,
    /// Last invoke/resume finished with a final answer.
    Completed,
    /// Last invoke/resume failed inside the engine.
    Error,
}

impl SessionStatus {
    /// Canonical session lifecycle used by coordinator tests.
    pub const ASCII_STATE_MACHINE: &str = r#"(absent) --create--> idle
                      |
                      v
   +-------------> running -----> completed
   |                  |   \
   |                  |    +----> error
   |                  v
   +-- resume --- interrupted

completed/error/interrupted/idle --invoke--> running"#;

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Interrupted => "interrupted",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }

    /// Validate a status transition from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }

        match self {
            SessionStatus::Running => matches!(
                next,
                SessionStatus::Completed | SessionStatus::Interrupted | SessionStatus::Error
            ),
            SessionStatus::Idle
            | SessionStatus::Interrupted
            | SessionStatus::Completed
            | SessionStatus::Error => matches!(next, SessionStatus::Running),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(user_id, session_id)` identity of a session record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.session_id)
    }
}

/// Full session record as written to and read from a [`SessionStore`].
///
/// Every write replaces the whole record and re-arms `ttl`.
///
/// [`SessionStore`]: crate::storage::SessionStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub last_query: Option<String>,
    #[serde(default)]
    pub last_response: Option<AgentResponse>,
    /// Last write timestamp (unix millis).
    pub last_updated: u64,
    /// Sliding expiry window.
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl Session {
    /// Fresh `idle` record.
    pub fn idle(user_id: impl Into<String>, session_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            status: SessionStatus::Idle,
            last_query: None,
            last_response: None,
            last_updated: now_unix_millis(),
            ttl,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id.clone(), self.session_id.clone())
    }

    /// Record with `running` status and the given query; the previous response is cleared.
    #[must_use]
    pub fn into_running(mut self, query: Option<String>) -> Self {
        self.status = SessionStatus::Running;
        self.last_query = query;
        self.last_response = None;
        self.last_updated = now_unix_millis();
        self
    }

    /// Record settled with the outcome of an engine call.
    #[must_use]
    pub fn into_settled(mut self, response: AgentResponse) -> Self {
        self.status = response.status();
        self.last_response = Some(response);
        self.last_updated = now_unix_millis();
        self
    }
}

/// Current wall clock time in unix millis.
pub fn now_unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis().min(u128::from(u64::MAX)) as u64)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{AgentResponse, Outcome};
    use serde_json::json;

    #[test]
    fn running_can_settle_but_never_return_to_idle() {
        assert!(SessionStatus::Running.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::Running.can_transition_to(SessionStatus::Interrupted));
        assert!(SessionStatus::Running.can_transition_to(SessionStatus::Error));
        assert!(!SessionStatus::Running.can_transition_to(SessionStatus::Idle));
    }

    #[test]
    fn settled_states_only_reenter_running() {
        for status in [
            SessionStatus::Idle,
            SessionStatus::Interrupted,
            SessionStatus::Completed,
            SessionStatus::Error,
        ] {
            assert!(status.can_transition_to(SessionStatus::Running));
            assert!(!status.can_transition_to(SessionStatus::Idle) || status == SessionStatus::Idle);
        }
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Interrupted));
        assert!(!SessionStatus::Idle.can_transition_to(SessionStatus::Completed));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(SessionStatus::Interrupted).unwrap(),
            json!("interrupted")
        );
        assert_eq!(SessionStatus::Running.to_string(), "running");
    }

    #[test]
    fn into_running_clears_last_response() {
        let session = Session::idle("u1", "s1", Duration::from_secs(60)).into_settled(
            AgentResponse::new("s1", Outcome::error("boom")),
        );
        assert_eq!(session.status, SessionStatus::Error);

        let running = session.into_running(Some("refund please".to_string()));
        assert_eq!(running.status, SessionStatus::Running);
        assert!(running.last_response.is_none());
        assert_eq!(running.last_query.as_deref(), Some("refund please"));
    }

    #[test]
    fn session_ttl_roundtrips_as_seconds() {
        let session = Session::idle("u1", "s1", Duration::from_secs(3600));
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["ttl"], json!(3600));
        assert_eq!(value["status"], json!("idle"));
        let parsed: Session = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.ttl, Duration::from_secs(3600));
    }
}
