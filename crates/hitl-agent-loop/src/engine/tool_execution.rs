//! Tool execution utilities.

use crate::contracts::tool::{Tool, ToolMap, ToolResult};
use crate::contracts::ToolCall;

/// Result of one tool call execution.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// Execute a single tool call. Missing tools and tool errors become error results.
pub async fn execute_single_tool(tool: Option<&dyn Tool>, call: &ToolCall) -> ToolExecution {
    let Some(tool) = tool else {
        return ToolExecution {
            call: call.clone(),
            result: ToolResult::error(&call.name, format!("Tool '{}' not found", call.name)),
        };
    };

    let result = match tool.execute(call.arguments.clone()).await {
        Ok(r) => r,
        Err(e) => ToolResult::error(&call.name, e.to_string()),
    };

    if result.is_success() {
        tracing::debug!(tool = %call.name, call_id = %call.id, "tool executed");
    } else {
        tracing::warn!(tool = %call.name, call_id = %call.id, error = %result.to_text(), "tool failed");
    }

    ToolExecution {
        call: call.clone(),
        result,
    }
}

/// Look the call up in `tools` and execute it.
pub async fn execute_call(tools: &ToolMap, call: &ToolCall) -> ToolExecution {
    execute_single_tool(tools.get(&call.name).map(|t| t.as_ref()), call).await
}
