//! Shared contracts for human-in-the-loop sessions: records, outcomes, decisions, tools and storage.
#![allow(missing_docs)]

pub mod io;
pub mod outcome;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod thread;
pub mod tool;

// session
pub use session::{now_unix_millis, Session, SessionKey, SessionStatus};

// outcome
pub use outcome::{ActionRequest, AgentResponse, InterruptConfig, InterruptData, Outcome};

// io
pub use io::{Decision, PendingActionStatus, ProtocolError};

// thread
pub use thread::{gen_call_id, Message, Role, ToolCall};

// tool
pub use tool::{
    tool_map, Tool, ToolDescriptor, ToolError, ToolMap, ToolResult, ToolStatus, TypedTool,
};

// runtime
pub use runtime::{
    Checkpoint, DecisionEngine, EngineError, EngineOutcome, PendingAction, RunInput,
};

// storage
pub use storage::{
    CheckpointStore, CheckpointStoreError, PreferenceStore, PreferenceStoreError, SessionStore,
    SessionStoreError,
};
