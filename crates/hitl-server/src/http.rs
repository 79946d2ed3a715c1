use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use hitl_contract::io::{
    ActiveSessionView, InvokeRequest, PreferenceReadResponse, PreferenceWriteRequest,
    PreferenceWriteResponse, ResumeRequest, SessionListView, SessionStatusView, StatusMessage,
    SystemInfo,
};
use hitl_contract::AgentResponse;

use crate::service::{require_id, ApiError};

pub use crate::service::AppState;

/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";
pub const INVOKE_PATH: &str = "/agent/invoke";
pub const RESUME_PATH: &str = "/agent/resume";
pub const STATUS_PATH: &str = "/agent/status/:user_id/:session_id";
pub const ACTIVE_SESSION_PATH: &str = "/agent/active/sessionid/:user_id";
pub const SESSION_IDS_PATH: &str = "/agent/sessionids/:user_id";
pub const SYSTEM_INFO_PATH: &str = "/system/info";
pub const SESSION_PATH: &str = "/agent/session/:user_id/:session_id";
pub const WRITE_LONGTERM_PATH: &str = "/agent/write/longterm";
pub const READ_LONGTERM_PATH: &str = "/agent/read/longterm/:user_id";

/// Build health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route(HEALTH_PATH, get(health))
}

/// Build session routes: invoke/resume, projections, delete and long-term preferences.
pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route(INVOKE_PATH, post(invoke))
        .route(RESUME_PATH, post(resume))
        .route(STATUS_PATH, get(status))
        .route(ACTIVE_SESSION_PATH, get(active_session))
        .route(SESSION_IDS_PATH, get(session_ids))
        .route(SYSTEM_INFO_PATH, get(system_info))
        .route(SESSION_PATH, delete(delete_session))
        .route(WRITE_LONGTERM_PATH, post(write_longterm))
        .route(READ_LONGTERM_PATH, get(read_longterm))
}

/// Full application router with state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(agent_routes())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn invoke(
    State(st): State<AppState>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require_id("user_id", &req.user_id)?;
    require_id("session_id", &req.session_id)?;
    let response = st
        .os
        .invoke(
            &req.user_id,
            &req.session_id,
            &req.query,
            req.system_message.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

async fn resume(
    State(st): State<AppState>,
    Json(req): Json<ResumeRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require_id("user_id", &req.user_id)?;
    require_id("session_id", &req.session_id)?;
    // Malformed decisions fail before the session is looked at.
    let decision = req.decision()?;
    let response = st
        .os
        .resume(&req.user_id, &req.session_id, decision)
        .await?;
    Ok(Json(response))
}

async fn status(
    State(st): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Result<Json<SessionStatusView>, ApiError> {
    Ok(Json(st.os.status(&user_id, &session_id).await?))
}

async fn active_session(
    State(st): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ActiveSessionView>, ApiError> {
    let active_session_id = st.os.active_session(&user_id).await?;
    Ok(Json(ActiveSessionView { active_session_id }))
}

async fn session_ids(
    State(st): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionListView>, ApiError> {
    let session_ids = st.os.list_sessions(&user_id).await?;
    Ok(Json(SessionListView { session_ids }))
}

async fn system_info(State(st): State<AppState>) -> Result<Json<SystemInfo>, ApiError> {
    Ok(Json(st.os.system_info().await?))
}

async fn delete_session(
    State(st): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Result<Json<StatusMessage>, ApiError> {
    st.os.delete_session(&user_id, &session_id).await?;
    Ok(Json(StatusMessage::success(format!(
        "session {session_id} of user {user_id} deleted"
    ))))
}

async fn write_longterm(
    State(st): State<AppState>,
    Json(req): Json<PreferenceWriteRequest>,
) -> Result<Json<PreferenceWriteResponse>, ApiError> {
    require_id("user_id", &req.user_id)?;
    let memory_id = st.os.write_preference(&req.user_id, &req.memory_info).await?;
    Ok(Json(PreferenceWriteResponse {
        status: "success".to_string(),
        memory_id,
        message: format!("preference stored for user {}", req.user_id),
    }))
}

async fn read_longterm(
    State(st): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PreferenceReadResponse>, ApiError> {
    let long_term_info = st.os.read_preferences(&user_id).await?;
    Ok(Json(PreferenceReadResponse {
        user_id,
        long_term_info,
    }))
}
