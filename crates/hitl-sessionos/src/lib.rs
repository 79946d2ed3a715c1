//! Session coordinator for human-in-the-loop runs.
#![allow(missing_docs)]

pub use hitl_contract as contracts;
pub mod orchestrator;

pub use orchestrator::{
    SessionOs, SessionOsBuildError, SessionOsBuilder, SessionOsError, DEFAULT_SESSION_TTL,
    DEFAULT_SYSTEM_PROMPT,
};
