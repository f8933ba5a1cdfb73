//! Plan Oracle
//!
//! The reasoning backend used for plan generation and cognitive actions.
//! Treated as an opaque, fallible function from prompt to text: callers own
//! all parsing and validation of whatever comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use thiserror::Error;

pub mod openrouter;
pub mod scripted;

pub use openrouter::OpenRouterOracle;
pub use scripted::ScriptedOracle;

/// Oracle backend errors
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend rejected request: {0}")]
    Api(String),

    #[error("no API key configured")]
    NoApiKey,

    #[error("invalid response shape")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,

    #[error("generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, OracleError>;

/// A single text-generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Short tag describing the task, for routing/telemetry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_hint: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the backend for a JSON-only response where supported
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            task_hint: None,
            temperature: 0.1,
            max_tokens: 4096,
            json_mode: false,
        }
    }

    pub fn with_task_hint(mut self, hint: impl Into<String>) -> Self {
        self.task_hint = Some(hint.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Reasoning oracle contract
///
/// No guarantee of well-formed output: `generate` may fail outright or
/// return text that does not parse as what the caller asked for.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate text for the given request
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Backend name, for logs
    fn name(&self) -> String;

    /// Whether the backend has what it needs to serve requests
    fn is_configured(&self) -> bool;
}
