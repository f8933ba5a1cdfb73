//! Scripted oracle backend
//!
//! Serves canned replies in order, for tests and offline runs. A reply can
//! be a failure, so failure paths are scriptable too.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use crate::{GenerateRequest, Oracle, OracleError, Result};

enum Reply {
    Text(String),
    Failure(String),
}

/// Oracle that replays a fixed script
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Reply>>,
    /// Served when the script runs out
    fallback: Option<String>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
        }
    }

    /// Oracle that answers every request with the same text
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(text.into()),
        }
    }

    pub fn push_reply(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Text(text.into()));
        self
    }

    pub fn push_failure(self, reason: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Failure(reason.into()));
        self
    }
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        debug!(
            "scripted oracle serving request (hint: {:?})",
            request.task_hint
        );

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(reason)) => Err(OracleError::Generation(reason)),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(OracleError::Generation("script exhausted".to_string())),
            },
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_served_in_order() {
        let oracle = ScriptedOracle::new().push_reply("first").push_reply("second");

        let a = oracle.generate(GenerateRequest::new("x")).await.unwrap();
        let b = oracle.generate(GenerateRequest::new("y")).await.unwrap();
        assert_eq!(a, "first");
        assert_eq!(b, "second");
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let oracle = ScriptedOracle::new().push_failure("backend down");

        let err = oracle.generate(GenerateRequest::new("x")).await.unwrap_err();
        assert!(err.to_string().contains("backend down"));
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let oracle = ScriptedOracle::new();
        assert!(oracle.generate(GenerateRequest::new("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_always_fallback() {
        let oracle = ScriptedOracle::always("same");
        for _ in 0..3 {
            let out = oracle.generate(GenerateRequest::new("x")).await.unwrap();
            assert_eq!(out, "same");
        }
    }
}
