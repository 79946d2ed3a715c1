//! Tool contract.

pub mod contract;

pub use contract::{
    tool_map, Tool, ToolDescriptor, ToolError, ToolMap, ToolResult, ToolStatus, TypedTool,
};
