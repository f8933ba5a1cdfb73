//! OpenRouter/OpenAI-compatible oracle backend

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

/// HTTP oracle against an OpenAI-compatible chat completions endpoint
pub struct OpenRouterOracle {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenRouterOracle {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        model: Option<String>,
    ) -> Self {
        let api_key = api_key.into();
        let is_openrouter = api_key.starts_with("sk-or-")
            || api_base
                .as_ref()
                .map(|b| b.contains("openrouter"))
                .unwrap_or(false);

        let api_base = api_base.unwrap_or_else(|| {
            if is_openrouter {
                "https://openrouter.ai/api/v1".to_string()
            } else {
                "https://api.openai.com/v1".to_string()
            }
        });

        let model = model.unwrap_or_else(|| {
            if is_openrouter {
                "anthropic/claude-sonnet-4".to_string()
            } else {
                "gpt-4".to_string()
            }
        });

        Self {
            client: Client::new(),
            api_key,
            api_base,
            model,
        }
    }

    fn build_request(&self, request: &GenerateRequest) -> serde_json::Value {
        let mut system = "You are a precise reasoning engine.".to_string();
        if let Some(hint) = &request.task_hint {
            system.push_str(&format!(" Task: {}.", hint));
        }

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String> {
        let choice = json["choices"].get(0).ok_or(OracleError::InvalidResponse)?;
        choice["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(OracleError::InvalidResponse)
    }
}

#[async_trait::async_trait]
impl Oracle for OpenRouterOracle {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(OracleError::NoApiKey);
        }

        trace!("oracle request to {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            if status.as_u16() == 429 {
                return Err(OracleError::RateLimited);
            }
            return Err(OracleError::Api(error));
        }

        let text = self.parse_response(json)?;
        debug!("oracle returned {} chars", text.len());
        Ok(text)
    }

    fn name(&self) -> String {
        format!("openrouter ({})", self.model)
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
