use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hitl_contract::ProtocolError;
use hitl_sessionos::{SessionOs, SessionOsError};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub os: Arc<SessionOs>,
}

impl AppState {
    pub fn new(os: SessionOs) -> Self {
        Self { os: Arc::new(os) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    UnsupportedDecision(String),

    #[error("{0}")]
    DecisionNotAllowed(String),

    #[error("{0}")]
    InvalidDecision(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::UnsupportedDecision(_) => "unsupported_decision",
            ApiError::DecisionNotAllowed(_) => "decision_not_allowed",
            ApiError::InvalidDecision(_) => "invalid_decision",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal(_)) {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string(), "code": self.code() }));
        (self.status_code(), body).into_response()
    }
}

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::UnsupportedDecision(_) => ApiError::UnsupportedDecision(e.to_string()),
            other => ApiError::InvalidDecision(other.to_string()),
        }
    }
}

impl From<SessionOsError> for ApiError {
    fn from(e: SessionOsError) -> Self {
        match e {
            SessionOsError::NotFound { .. } | SessionOsError::UserNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            SessionOsError::InvalidState { .. } => ApiError::InvalidState(e.to_string()),
            SessionOsError::DecisionNotAllowed(_) => ApiError::DecisionNotAllowed(e.to_string()),
            SessionOsError::Protocol(protocol) => protocol.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Reject blank identifiers before they reach the store.
pub fn require_id(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}
