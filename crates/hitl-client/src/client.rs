//! Typed client for the session HTTP API.

use crate::error::{ClientError, Result};
use hitl_contract::io::{
    ActiveSessionView, InvokeRequest, PreferenceReadResponse, PreferenceWriteRequest,
    PreferenceWriteResponse, ResumeRequest, SessionListView, SessionStatusView, StatusMessage,
    SystemInfo,
};
use hitl_contract::{AgentResponse, Decision};
use reqwest::{Client as HttpClient, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for one session service.
///
/// Ids are sent as percent-encoded path segments, so any user or session id
/// reaches its own route.
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = hitl_client::ApiClient::new("http://localhost:8001")?;
/// let response = client.invoke("u1", "s1", "refund ORD20260103003 50").await?;
/// println!("{:?}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: HttpClient,
}

impl ApiClient {
    /// Create a client with [`DEFAULT_TIMEOUT`].
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let raw = base_url.into();
        if !raw.starts_with("http://") && !raw.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {raw}"
            )));
        }
        let base_url =
            Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(raw));
        }
        let http = HttpClient::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = HttpClient::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self.http.get(self.url(segments)?).send().await?;
        handle_response(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let response = self.http.post(self.url(segments)?).json(body).send().await?;
        handle_response(response).await
    }

    pub async fn invoke(
        &self,
        user_id: &str,
        session_id: &str,
        query: &str,
    ) -> Result<AgentResponse> {
        self.post(
            &["agent", "invoke"],
            &InvokeRequest {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                query: query.to_string(),
                system_message: None,
            },
        )
        .await
    }

    pub async fn resume(
        &self,
        user_id: &str,
        session_id: &str,
        decision: &Decision,
    ) -> Result<AgentResponse> {
        self.post(
            &["agent", "resume"],
            &ResumeRequest::new(user_id, session_id, decision),
        )
        .await
    }

    pub async fn status(&self, user_id: &str, session_id: &str) -> Result<SessionStatusView> {
        self.get(&["agent", "status", user_id, session_id]).await
    }

    /// Most recently written live session, `""` if none.
    pub async fn active_session(&self, user_id: &str) -> Result<String> {
        let view: ActiveSessionView = self.get(&["agent", "active", "sessionid", user_id]).await?;
        Ok(view.active_session_id)
    }

    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<String>> {
        let view: SessionListView = self.get(&["agent", "sessionids", user_id]).await?;
        Ok(view.session_ids)
    }

    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.get(&["system", "info"]).await
    }

    /// Delete a session; a missing session is an API 404 error.
    pub async fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<StatusMessage> {
        let url = self.url(&["agent", "session", user_id, session_id])?;
        let response = self.http.delete(url).send().await?;
        handle_response(response).await
    }

    /// Delete that treats an already-missing session as success.
    ///
    /// Returns `true` when a record was removed by this call.
    pub async fn delete_session_idempotent(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        match self.delete_session(user_id, session_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn write_preference(
        &self,
        user_id: &str,
        memory_info: &str,
    ) -> Result<PreferenceWriteResponse> {
        self.post(
            &["agent", "write", "longterm"],
            &PreferenceWriteRequest {
                user_id: user_id.to_string(),
                memory_info: memory_info.to_string(),
            },
        )
        .await
    }

    pub async fn read_preferences(&self, user_id: &str) -> Result<String> {
        let view: PreferenceReadResponse =
            self.get(&["agent", "read", "longterm", user_id]).await?;
        Ok(view.long_term_info)
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
    let field = |key: &str| {
        parsed
            .as_ref()
            .and_then(|json| json[key].as_str())
            .map(str::to_string)
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code: field("code"),
        message: field("error").unwrap_or(body),
    })
}
