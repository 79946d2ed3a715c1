//! `SessionOs`: sequences session store writes around each engine call.

mod locks;

use crate::contracts::io::{SessionStatusView, SystemInfo};
use crate::contracts::storage::{
    PreferenceStore, PreferenceStoreError, SessionStore, SessionStoreError,
};
use crate::contracts::{
    AgentResponse, Decision, DecisionEngine, Outcome, ProtocolError, RunInput, Session,
    SessionKey, SessionStatus,
};
use locks::KeyedLocks;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Sliding TTL applied to every session write unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a refund assistant. Look up orders, explain refund options, and submit refunds.";

/// Caller-visible coordinator failures.
#[derive(Debug, Error)]
pub enum SessionOsError {
    #[error("session {session_id} of user {user_id} not found")]
    NotFound { user_id: String, session_id: String },

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("session {session_id} is {status}, expected interrupted")]
    InvalidState {
        session_id: String,
        status: SessionStatus,
    },

    #[error("decision '{0}' is not allowed at this pause point")]
    DecisionNotAllowed(&'static str),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("preference store error: {0}")]
    Preference(#[from] PreferenceStoreError),

    #[error("illegal session transition {from} -> {to}")]
    IllegalTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("session task failed: {0}")]
    Task(String),
}

impl SessionOsError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::UserNotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::DecisionNotAllowed(_) => "decision_not_allowed",
            Self::Protocol(ProtocolError::UnsupportedDecision(_)) => "unsupported_decision",
            Self::Protocol(_) => "invalid_decision",
            Self::Store(_)
            | Self::Preference(_)
            | Self::IllegalTransition { .. }
            | Self::Task(_) => "internal",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionOsBuildError {
    #[error("session store not configured")]
    MissingSessionStore,

    #[error("decision engine not configured")]
    MissingEngine,

    #[error("preference store not configured")]
    MissingPreferenceStore,

    #[error("session ttl must be positive")]
    ZeroTtl,
}

/// Session coordinator. Built once at startup and shared by all callers.
#[derive(Clone)]
pub struct SessionOs {
    store: Arc<dyn SessionStore>,
    engine: Arc<dyn DecisionEngine>,
    preferences: Arc<dyn PreferenceStore>,
    session_ttl: Duration,
    system_prompt: String,
    locks: Arc<KeyedLocks>,
}

#[derive(Clone)]
pub struct SessionOsBuilder {
    store: Option<Arc<dyn SessionStore>>,
    engine: Option<Arc<dyn DecisionEngine>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    session_ttl: Duration,
    system_prompt: String,
}

impl Default for SessionOsBuilder {
    fn default() -> Self {
        Self {
            store: None,
            engine: None,
            preferences: None,
            session_ttl: DEFAULT_SESSION_TTL,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl SessionOsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn DecisionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    #[must_use]
    pub fn with_preference_store(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn build(self) -> Result<SessionOs, SessionOsBuildError> {
        if self.session_ttl.is_zero() {
            return Err(SessionOsBuildError::ZeroTtl);
        }
        Ok(SessionOs {
            store: self.store.ok_or(SessionOsBuildError::MissingSessionStore)?,
            engine: self.engine.ok_or(SessionOsBuildError::MissingEngine)?,
            preferences: self
                .preferences
                .ok_or(SessionOsBuildError::MissingPreferenceStore)?,
            session_ttl: self.session_ttl,
            system_prompt: self.system_prompt,
            locks: Arc::new(KeyedLocks::default()),
        })
    }
}

impl SessionOs {
    pub fn builder() -> SessionOsBuilder {
        SessionOsBuilder::new()
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Run a query on the session, creating it `idle` first if absent.
    ///
    /// Engine failures are persisted and returned as an `error` outcome. The
    /// run continues to completion even if the caller goes away.
    pub async fn invoke(
        &self,
        user_id: &str,
        session_id: &str,
        query: &str,
        system_message: Option<&str>,
    ) -> Result<AgentResponse, SessionOsError> {
        let os = self.clone();
        let key = SessionKey::new(user_id, session_id);
        let query = query.to_string();
        let system_message = system_message.map(str::to_string);
        detached(async move { os.invoke_locked(key, query, system_message).await }).await
    }

    /// Inject a human decision into an interrupted session.
    ///
    /// Like [`SessionOs::invoke`], the resumed run is not tied to the caller.
    pub async fn resume(
        &self,
        user_id: &str,
        session_id: &str,
        decision: Decision,
    ) -> Result<AgentResponse, SessionOsError> {
        let os = self.clone();
        let key = SessionKey::new(user_id, session_id);
        detached(async move { os.resume_locked(key, decision).await }).await
    }

    async fn invoke_locked(
        &self,
        key: SessionKey,
        query: String,
        system_message: Option<String>,
    ) -> Result<AgentResponse, SessionOsError> {
        let _guard = self.locks.lock(key.clone()).await;
        let (user_id, session_id) = (key.user_id.as_str(), key.session_id.as_str());

        let session = match self.store.get(user_id, session_id).await? {
            Some(existing) => existing,
            None => self.create_idle(user_id, session_id).await?,
        };
        tracing::info!(user_id, session_id, previous = %session.status, "invoke");

        let previous = session.status;
        let mut session = session.into_running(Some(query.clone()));
        session.ttl = self.session_ttl;
        self.write(previous, &session).await?;

        let instruction = system_message.as_deref().unwrap_or(&self.system_prompt);
        let input = RunInput {
            system: self.decorated_system_prompt(user_id, instruction).await,
            query,
        };
        let outcome = match self.engine.run(&key, input).await {
            Ok(outcome) => Outcome::from(outcome),
            Err(e) => {
                tracing::warn!(user_id, session_id, error = %e, "engine run failed");
                Outcome::error(e.to_string())
            }
        };

        self.settle(session, outcome).await
    }

    async fn resume_locked(
        &self,
        key: SessionKey,
        decision: Decision,
    ) -> Result<AgentResponse, SessionOsError> {
        let _guard = self.locks.lock(key.clone()).await;
        let (user_id, session_id) = (key.user_id.as_str(), key.session_id.as_str());

        let session = self
            .store
            .get(user_id, session_id)
            .await?
            .ok_or_else(|| SessionOsError::NotFound {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
            })?;
        if session.status != SessionStatus::Interrupted {
            return Err(SessionOsError::InvalidState {
                session_id: session_id.to_string(),
                status: session.status,
            });
        }
        if let Some(interrupt) = session
            .last_response
            .as_ref()
            .and_then(AgentResponse::interrupt_data)
        {
            if !decision.permitted_by(&interrupt.config) {
                return Err(SessionOsError::DecisionNotAllowed(decision.kind()));
            }
        }
        tracing::info!(user_id, session_id, decision = decision.kind(), "resume");

        let query = session.last_query.clone();
        let mut session = session.into_running(query);
        session.ttl = self.session_ttl;
        self.write(SessionStatus::Interrupted, &session).await?;

        let outcome = match self.engine.resume(&key, decision).await {
            Ok(outcome) => Outcome::from(outcome),
            Err(e) => {
                tracing::warn!(user_id, session_id, error = %e, "engine resume failed");
                Outcome::error(e.to_string())
            }
        };

        self.settle(session, outcome).await
    }

    pub async fn status(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionStatusView, SessionOsError> {
        Ok(match self.store.get(user_id, session_id).await? {
            Some(session) => session.into(),
            None => SessionStatusView::not_found(user_id, session_id),
        })
    }

    /// Most recently written live session id, `""` if none.
    pub async fn active_session(&self, user_id: &str) -> Result<String, SessionOsError> {
        Ok(self
            .store
            .active_session_id(user_id)
            .await?
            .unwrap_or_default())
    }

    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<String>, SessionOsError> {
        Ok(self
            .store
            .all_session_ids(user_id)
            .await?
            .into_iter()
            .collect())
    }

    pub async fn system_info(&self) -> Result<SystemInfo, SessionOsError> {
        let sessions_count = self.store.session_count().await?;
        let active_users = self
            .store
            .all_users_and_sessions()
            .await?
            .into_iter()
            .map(|(user, ids)| (user, ids.into_iter().collect()))
            .collect();
        Ok(SystemInfo {
            sessions_count,
            active_users,
        })
    }

    /// Delete a live session. A missing session is [`SessionOsError::NotFound`].
    pub async fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), SessionOsError> {
        let _guard = self.locks.lock(SessionKey::new(user_id, session_id)).await;

        if !self.store.exists(user_id, session_id).await? {
            return Err(SessionOsError::NotFound {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
            });
        }
        self.store.delete(user_id, session_id).await?;
        if let Err(e) = self
            .engine
            .discard(&SessionKey::new(user_id, session_id))
            .await
        {
            tracing::warn!(user_id, session_id, error = %e, "failed to discard engine state");
        }
        tracing::info!(user_id, session_id, "session deleted");
        Ok(())
    }

    /// Store a long-term preference entry for a user known to the session registry.
    pub async fn write_preference(
        &self,
        user_id: &str,
        info: &str,
    ) -> Result<String, SessionOsError> {
        if !self.store.user_exists(user_id).await? {
            return Err(SessionOsError::UserNotFound(user_id.to_string()));
        }
        let memory_id = self.preferences.write(user_id, info).await?;
        tracing::info!(user_id, memory_id = %memory_id, "preference stored");
        Ok(memory_id)
    }

    /// All preference entries joined by a single space.
    pub async fn read_preferences(&self, user_id: &str) -> Result<String, SessionOsError> {
        Ok(self.preferences.read(user_id).await?.join(" "))
    }

    /// `instruction` decorated with the user's preferences, if any.
    ///
    /// A preference read failure yields the undecorated instruction.
    pub async fn decorated_system_prompt(&self, user_id: &str, instruction: &str) -> String {
        match self.read_preferences(user_id).await {
            Ok(preferences) if !preferences.trim().is_empty() => {
                format!("{instruction} Additional information about me: {preferences}")
            }
            Ok(_) => instruction.to_string(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "preference read failed");
                instruction.to_string()
            }
        }
    }

    /// Drop expired session records.
    pub async fn purge_expired(&self) -> Result<usize, SessionOsError> {
        Ok(self.store.purge_expired().await?)
    }

    async fn create_idle(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, SessionOsError> {
        let idle = Session::idle(user_id, session_id, self.session_ttl);
        match self.store.create(&idle).await {
            Ok(()) => {
                tracing::info!(user_id, session_id, "session created");
                Ok(idle)
            }
            Err(SessionStoreError::AlreadyExists) => Ok(self
                .store
                .get(user_id, session_id)
                .await?
                .unwrap_or(idle)),
            Err(e) => Err(e.into()),
        }
    }

    async fn settle(
        &self,
        session: Session,
        outcome: Outcome,
    ) -> Result<AgentResponse, SessionOsError> {
        let response = AgentResponse::new(session.session_id.clone(), outcome);
        let previous = session.status;
        let settled = session.into_settled(response.clone());
        self.write(previous, &settled).await?;
        tracing::info!(
            user_id = %settled.user_id,
            session_id = %settled.session_id,
            status = %settled.status,
            "session settled"
        );
        Ok(response)
    }

    /// Status write checked against the session state machine.
    async fn write(&self, from: SessionStatus, next: &Session) -> Result<(), SessionOsError> {
        if !from.can_transition_to(next.status) {
            tracing::error!(
                user_id = %next.user_id,
                session_id = %next.session_id,
                from = %from,
                to = %next.status,
                "illegal session transition"
            );
            return Err(SessionOsError::IllegalTransition {
                from,
                to: next.status,
            });
        }
        self.store.update(next).await?;
        Ok(())
    }
}

/// Run a coordinator call on its own task so a dropped caller cannot cut it short.
async fn detached<F>(call: F) -> Result<AgentResponse, SessionOsError>
where
    F: Future<Output = Result<AgentResponse, SessionOsError>> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(result) => result,
        Err(e) => Err(SessionOsError::Task(e.to_string())),
    }
}
