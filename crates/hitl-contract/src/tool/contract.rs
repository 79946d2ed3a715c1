//! Tool trait for engine actions.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Tool execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    /// Executed, but the domain outcome is negative (e.g. unknown order).
    Warning,
    Error,
}

/// Result of tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub status: ToolStatus,
    pub data: Value,
    pub message: Option<String>,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Success,
            data: data.into(),
            message: None,
        }
    }

    /// Create a success result with message.
    pub fn success_with_message(
        tool_name: impl Into<String>,
        data: impl Into<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(tool_name, data)
        }
    }

    pub fn warning(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Warning,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Error,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ToolStatus::Success | ToolStatus::Warning)
    }

    /// Text fed back into the transcript: the message if present, else the data.
    pub fn to_text(&self) -> String {
        match (&self.message, &self.data) {
            (Some(message), _) => message.clone(),
            (None, Value::String(s)) => s.clone(),
            (None, Value::Null) => String::new(),
            (None, data) => data.to_string(),
        }
    }
}

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tool descriptor containing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    /// JSON schema for parameters.
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }
}

/// Action the engine can execute.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with JSON arguments.
    ///
    /// Domain failures that the caller should read (unknown order, etc.) are
    /// `Ok` results with a non-success status; `Err` is reserved for argument
    /// and infrastructure failures.
    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError>;
}

/// Strongly-typed variant of [`Tool`] with schema generated from `Args`.
///
/// A blanket impl provides [`Tool`].
#[async_trait]
pub trait TypedTool: Send + Sync {
    type Args: for<'de> Deserialize<'de> + JsonSchema + Send;

    fn tool_id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Business validation after deserialization.
    fn validate(&self, _args: &Self::Args) -> Result<(), String> {
        Ok(())
    }

    async fn execute(&self, args: Self::Args) -> Result<ToolResult, ToolError>;
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.tool_id(), self.name(), self.description())
            .with_parameters(typed_tool_schema::<T::Args>())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult, ToolError> {
        let typed: T::Args = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        self.validate(&typed).map_err(ToolError::InvalidArguments)?;
        TypedTool::execute(self, typed).await
    }
}

fn typed_tool_schema<A: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(A))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

/// Tools keyed by id.
pub type ToolMap = HashMap<String, Arc<dyn Tool>>;

/// Collect tools into a [`ToolMap`] keyed by descriptor id.
pub fn tool_map<I>(tools: I) -> ToolMap
where
    I: IntoIterator<Item = Arc<dyn Tool>>,
{
    tools
        .into_iter()
        .map(|tool| (tool.descriptor().id, tool))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoArgs {
        text: String,
    }

    struct EchoTool;

    #[async_trait]
    impl TypedTool for EchoTool {
        type Args = EchoArgs;

        fn tool_id(&self) -> &str {
            "echo"
        }

        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            "Echo text back"
        }

        fn validate(&self, args: &EchoArgs) -> Result<(), String> {
            if args.text.is_empty() {
                return Err("text must not be empty".into());
            }
            Ok(())
        }

        async fn execute(&self, args: EchoArgs) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success("echo", json!(args.text)))
        }
    }

    #[tokio::test]
    async fn typed_tool_deserializes_and_validates() {
        let tool: Arc<dyn Tool> = Arc::new(EchoTool);
        let descriptor = tool.descriptor();
        assert_eq!(descriptor.id, "echo");
        assert!(descriptor.parameters["properties"].get("text").is_some());

        let result = tool.execute(json!({"text": "hi"})).await.unwrap();
        assert_eq!(result.to_text(), "hi");

        let err = tool.execute(json!({"text": ""})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        let err = tool.execute(json!({"other": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_map_keys_by_descriptor_id() {
        let map = tool_map([Arc::new(EchoTool) as Arc<dyn Tool>]);
        assert!(map.contains_key("echo"));
    }

    #[test]
    fn result_text_prefers_message() {
        let result = ToolResult::success_with_message("t", json!({"a": 1}), "refund issued");
        assert_eq!(result.to_text(), "refund issued");
        assert_eq!(ToolResult::success("t", json!({"a": 1})).to_text(), r#"{"a":1}"#);
        assert!(ToolResult::warning("t", "order not found").is_success());
    }
}
