//! HTTP server for human-in-the-loop refund review sessions.
#![allow(missing_docs)]

pub mod http;
pub mod refund;
pub mod service;

use hitl_extension_escalation::EscalationPolicy;
use hitl_sessionos::{SessionOs, SessionOsBuildError};
use hitl_store_adapters::{MemoryCheckpointStore, MemoryPreferenceStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;

/// Session coordinator over in-memory stores and the refund engine.
pub fn build_refund_os(
    policy: EscalationPolicy,
    session_ttl: Duration,
    system_prompt: Option<String>,
) -> Result<SessionOs, SessionOsBuildError> {
    let engine = refund::refund_engine(policy, Arc::new(MemoryCheckpointStore::new()));
    let mut builder = SessionOs::builder()
        .with_session_store(Arc::new(MemoryStore::new()))
        .with_preference_store(Arc::new(MemoryPreferenceStore::new()))
        .with_engine(Arc::new(engine))
        .with_session_ttl(session_ttl);
    if let Some(prompt) = system_prompt {
        builder = builder.with_system_prompt(prompt);
    }
    builder.build()
}
