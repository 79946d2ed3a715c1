//! Engine transcript.

mod message;

pub use message::{Message, Role, ToolCall};

/// Message id for a new tool call.
pub fn gen_call_id() -> String {
    format!("call_{}", uuid::Uuid::now_v7().simple())
}
