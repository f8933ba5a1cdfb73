//! Tool capabilities
//!
//! A tool is an external unit of work: it takes a JSON params object and
//! returns a structured outcome carrying a `status` field. Tools are supplied
//! by collaborators and looked up through the registry by id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("tool '{0}' failed: {1}")]
    Execution(String, String),

    #[error("tool '{0}' returned malformed output")]
    MalformedOutcome(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// Outcome status reported by a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Error,
    Failure,
}

/// Structured result of a tool invocation
///
/// Serializes to a JSON object with at least a `status` field; arbitrary
/// payload fields ride alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: None,
            payload: serde_json::Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: Some(message.into()),
            payload: serde_json::Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            message: Some(message.into()),
            payload: serde_json::Map::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.payload.insert(key.into(), value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Parse a raw value as an outcome; a missing or unknown `status` field
    /// means the tool output is malformed.
    pub fn from_value(tool_id: &str, value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|_| ToolError::MalformedOutcome(tool_id.to_string()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Tool capability contract
#[async_trait]
pub trait ToolCapability: Send + Sync {
    /// Registry id of the tool
    fn id(&self) -> &str;

    /// One-line description, used in planning prompts
    fn description(&self) -> &str;

    /// Execute with the full params object, including the `command` the tool
    /// interprets internally.
    async fn execute(&self, params: Value) -> Result<Outcome>;
}

type BoxedTool = Box<dyn ToolCapability + Send + Sync>;

/// Tool lookup table
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: ToolCapability + 'static>(&mut self, tool: T) {
        debug!("registering tool '{}'", tool.id());
        self.tools.insert(tool.id().to_string(), Box::new(tool));
    }

    pub fn get(&self, id: &str) -> Option<&(dyn ToolCapability + Send + Sync)> {
        self.tools.get(id).map(|t| t.as_ref())
    }

    pub fn has(&self, id: &str) -> bool {
        self.tools.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tools.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// One `- id: description` line per tool, for planning prompts
    pub fn manifest(&self) -> String {
        let mut lines: Vec<String> = self
            .tools
            .values()
            .map(|t| format!("- {}: {}", t.id(), t.description()))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    pub async fn execute(&self, id: &str, params: Value) -> Result<Outcome> {
        let tool = self
            .tools
            .get(id)
            .ok_or_else(|| ToolError::NotFound(id.to_string()))?;
        tool.execute(params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl ToolCapability for EchoTool {
        fn id(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its params back"
        }

        async fn execute(&self, params: Value) -> Result<Outcome> {
            Ok(Outcome::success().with_payload("echo", params))
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_field() {
        let outcome = Outcome::success().with_payload("path", "a.txt");
        let value = outcome.to_value();

        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["path"], "a.txt");
    }

    #[test]
    fn test_outcome_from_value_requires_status() {
        assert!(Outcome::from_value("t", json!({ "status": "SUCCESS" })).is_ok());
        assert!(Outcome::from_value("t", json!({ "data": 1 })).is_err());
        assert!(Outcome::from_value("t", json!({ "status": "WEIRD" })).is_err());
        assert!(Outcome::from_value("t", json!("not an object")).is_err());
    }

    #[test]
    fn test_outcome_error_and_failure() {
        assert_eq!(Outcome::error("boom").status, OutcomeStatus::Error);
        assert_eq!(Outcome::failure("nope").status, OutcomeStatus::Failure);
        assert!(!Outcome::error("boom").is_success());
    }

    #[tokio::test]
    async fn test_registry_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert!(registry.has("echo"));
        assert_eq!(registry.ids(), vec!["echo"]);

        let outcome = registry
            .execute("echo", json!({ "command": "say" }))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.payload["echo"]["command"], "say");
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_manifest_lines() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert_eq!(registry.manifest(), "- echo: Echoes its params back");
    }
}
