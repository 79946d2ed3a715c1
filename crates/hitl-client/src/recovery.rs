//! Decide what to do with a previously used session id.

use crate::client::ApiClient;
use crate::error::ClientError;
use async_trait::async_trait;
use hitl_contract::io::SessionStatusView;
use hitl_contract::{InterruptData, Outcome, SessionStatus};
use std::time::Duration;

/// What the caller should do with the session id it checked.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// Start a new run on the same id. `prior` is the previous answer or error to show.
    Fresh { prior: Option<String> },
    /// A decision is pending; resume with it next.
    ResumePending(InterruptData),
    /// Idle record; use it as is.
    Reuse,
    /// Still running after the poll budget; switch to a new session id.
    Abandon,
}

/// Bounded polling while a session reports `running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            attempts: 30,
        }
    }
}

/// Where session status comes from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionStatusView, ClientError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionStatusView, ClientError> {
        self.status(user_id, session_id).await
    }
}

/// Verdict for one status snapshot; `None` while the session is running.
pub fn evaluate(view: &SessionStatusView) -> Option<Recovery> {
    let SessionStatusView::Found(record) = view else {
        return Some(Recovery::Fresh { prior: None });
    };
    let last = record.last_response.as_ref();
    match record.status {
        SessionStatus::Running => None,
        SessionStatus::Idle => Some(Recovery::Reuse),
        SessionStatus::Interrupted => Some(
            match last.and_then(|response| response.interrupt_data()) {
                Some(interrupt) => Recovery::ResumePending(interrupt.clone()),
                None => Recovery::Fresh { prior: None },
            },
        ),
        SessionStatus::Completed => Some(Recovery::Fresh {
            prior: last
                .and_then(|response| response.final_message())
                .map(str::to_string),
        }),
        SessionStatus::Error => Some(Recovery::Fresh {
            prior: last.and_then(|response| match &response.outcome {
                Outcome::Error { message } => Some(format!("previous run failed: {message}")),
                _ => None,
            }),
        }),
    }
}

/// Check `session_id` and decide how to continue with it.
///
/// A transport failure yields [`Recovery::Fresh`].
pub async fn recover(
    source: &dyn StatusSource,
    user_id: &str,
    session_id: &str,
    poll: PollConfig,
) -> Recovery {
    let mut remaining = poll.attempts;
    loop {
        let view = match source.fetch_status(user_id, session_id).await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(user_id, session_id, error = %e, "status check failed, starting fresh");
                return Recovery::Fresh { prior: None };
            }
        };
        if let Some(verdict) = evaluate(&view) {
            return verdict;
        }
        if remaining == 0 {
            tracing::warn!(user_id, session_id, "session still running, abandoning it");
            return Recovery::Abandon;
        }
        remaining -= 1;
        tracing::debug!(user_id, session_id, remaining, "session running, polling");
        tokio::time::sleep(poll.interval).await;
    }
}
