//! Action handlers and their dispatch table
//!
//! Every plan step is dispatched by tag through the registry. Handlers share
//! one contract: take the step's params, return the result payload or a
//! failure reason. Orchestrators extend the table with their own handlers
//! through `register`; a tag collision is an explicit error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use axon_oracle::{GenerateRequest, Oracle};
use axon_tools::ToolRegistry;

use crate::beliefs::{BeliefSource, BeliefStore};
use crate::{BdiError, Result};

pub const THINK: &str = "THINK";
pub const DECOMPOSE_GOAL: &str = "DECOMPOSE_GOAL";
pub const ANALYZE_FAILURE: &str = "ANALYZE_FAILURE";
pub const UPDATE_BELIEF: &str = "UPDATE_BELIEF";
pub const NO_OP: &str = "NO_OP";
pub const FAIL: &str = "FAIL";
pub const EXECUTE_TOOL: &str = "EXECUTE_TOOL";

/// Ok carries the handler's result payload, Err the failure reason
pub type ActionResult = std::result::Result<Value, String>;

/// One action handler: receives params, reports success or failure
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Tag this handler is dispatched under
    fn tag(&self) -> &str;

    async fn execute(&self, params: &Value) -> ActionResult;
}

/// Dispatch table from action tag to handler
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in handler catalogue
    pub fn with_builtins(
        oracle: Arc<dyn Oracle>,
        beliefs: Arc<dyn BeliefStore>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(ThinkAction));
        registry.insert(Arc::new(CognitiveAction::new(DECOMPOSE_GOAL, oracle.clone())));
        registry.insert(Arc::new(CognitiveAction::new(ANALYZE_FAILURE, oracle)));
        registry.insert(Arc::new(UpdateBeliefAction::new(beliefs)));
        registry.insert(Arc::new(NoOpAction));
        registry.insert(Arc::new(FailAction));
        registry.insert(Arc::new(ExecuteToolAction::new(tools)));
        registry
    }

    /// Register an additional handler; a duplicate tag is rejected
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> Result<()> {
        let tag = handler.tag().to_string();
        if self.handlers.contains_key(&tag) {
            return Err(BdiError::DuplicateAction(tag));
        }
        debug!("registered action handler '{}'", tag);
        self.handlers.insert(tag, handler);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(tag).cloned()
    }

    pub fn has(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Sorted tags, for planning prompts
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.handlers.keys().cloned().collect();
        tags.sort();
        tags
    }

    fn insert(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.tag().to_string(), handler);
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// THINK: records a thought, always succeeds
pub struct ThinkAction;

#[async_trait]
impl ActionHandler for ThinkAction {
    fn tag(&self) -> &str {
        THINK
    }

    async fn execute(&self, params: &Value) -> ActionResult {
        let thought = params
            .get("thought")
            .and_then(Value::as_str)
            .unwrap_or("No thought provided.");
        info!("agent thought: {}", thought);
        Ok(Value::String("Thought processed.".to_string()))
    }
}

/// DECOMPOSE_GOAL / ANALYZE_FAILURE: forwards a prompt to the oracle
pub struct CognitiveAction {
    tag: &'static str,
    oracle: Arc<dyn Oracle>,
}

impl CognitiveAction {
    pub fn new(tag: &'static str, oracle: Arc<dyn Oracle>) -> Self {
        Self { tag, oracle }
    }
}

#[async_trait]
impl ActionHandler for CognitiveAction {
    fn tag(&self) -> &str {
        self.tag
    }

    async fn execute(&self, params: &Value) -> ActionResult {
        let prompt = params
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or("Perform a cognitive task.");

        let request = GenerateRequest::new(prompt).with_task_hint(self.tag.to_lowercase());
        match self.oracle.generate(request).await {
            Ok(text) => Ok(Value::String(text)),
            Err(e) => Err(format!("oracle call failed: {}", e)),
        }
    }
}

/// UPDATE_BELIEF: writes a key/value into the belief store
pub struct UpdateBeliefAction {
    beliefs: Arc<dyn BeliefStore>,
}

impl UpdateBeliefAction {
    pub fn new(beliefs: Arc<dyn BeliefStore>) -> Self {
        Self { beliefs }
    }
}

#[async_trait]
impl ActionHandler for UpdateBeliefAction {
    fn tag(&self) -> &str {
        UPDATE_BELIEF
    }

    async fn execute(&self, params: &Value) -> ActionResult {
        let key = params.get("key").and_then(Value::as_str);
        let value = params.get("value");
        let (key, value) = match (key, value) {
            (Some(k), Some(v)) => (k, v.clone()),
            _ => return Err("missing 'key' or 'value'".to_string()),
        };

        self.beliefs
            .add_belief(key, value, 1.0, BeliefSource::SelfInference)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Value::String(format!("Belief '{}' updated.", key)))
    }
}

/// NO_OP: always succeeds, no effect
pub struct NoOpAction;

#[async_trait]
impl ActionHandler for NoOpAction {
    fn tag(&self) -> &str {
        NO_OP
    }

    async fn execute(&self, _params: &Value) -> ActionResult {
        Ok(Value::String("No operation performed.".to_string()))
    }
}

/// FAIL: always fails, with the plan-supplied reason
pub struct FailAction;

#[async_trait]
impl ActionHandler for FailAction {
    fn tag(&self) -> &str {
        FAIL
    }

    async fn execute(&self, params: &Value) -> ActionResult {
        Err(params
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("Intentional failure specified in plan.")
            .to_string())
    }
}

/// EXECUTE_TOOL: resolves a registered tool and runs it with the full params
pub struct ExecuteToolAction {
    tools: Arc<ToolRegistry>,
}

impl ExecuteToolAction {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ActionHandler for ExecuteToolAction {
    fn tag(&self) -> &str {
        EXECUTE_TOOL
    }

    async fn execute(&self, params: &Value) -> ActionResult {
        let tool_id = params
            .get("tool_id")
            .and_then(Value::as_str)
            .ok_or_else(|| "EXECUTE_TOOL requires a 'tool_id'".to_string())?;

        // Malformed tool output surfaces as an error from the registry.
        match self.tools.execute(tool_id, params.clone()).await {
            Ok(outcome) if outcome.is_success() => Ok(outcome.to_value()),
            Ok(outcome) => Err(outcome
                .message
                .unwrap_or_else(|| format!("tool '{}' reported a failure", tool_id))),
            Err(e) => Err(e.to_string()),
        }
    }
}
