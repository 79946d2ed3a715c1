//! Caller-facing inputs: decisions and HTTP bodies.

pub mod decision;
pub mod wire;

pub use decision::{Decision, PendingActionStatus, ProtocolError};
pub use wire::{
    ActiveSessionView, InvokeRequest, NotFoundView, PreferenceReadResponse,
    PreferenceWriteRequest, PreferenceWriteResponse, ResumeRequest, SessionListView,
    SessionRecordView, SessionStatusView, StatusMessage, SystemInfo,
};
