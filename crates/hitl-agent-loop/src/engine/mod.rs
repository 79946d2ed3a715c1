pub mod protocol;
pub mod tool_execution;
