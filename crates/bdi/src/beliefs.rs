//! Belief store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;

/// Provenance tag for a belief
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefSource {
    Perception,
    Communication,
    SelfInference,
    Default,
}

/// A single held belief
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Belief {
    pub value: Value,
    pub confidence: f64,
    pub source: BeliefSource,
    pub updated_at: DateTime<Local>,
}

/// Belief store contract
#[async_trait]
pub trait BeliefStore: Send + Sync {
    async fn add_belief(
        &self,
        key: &str,
        value: Value,
        confidence: f64,
        source: BeliefSource,
    ) -> Result<()>;

    async fn get_belief(&self, key: &str) -> Option<Belief>;
}

/// In-process belief store keyed by string
#[derive(Debug, Default)]
pub struct InMemoryBeliefStore {
    beliefs: RwLock<HashMap<String, Belief>>,
}

impl InMemoryBeliefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.beliefs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.beliefs.read().await.is_empty()
    }
}

#[async_trait]
impl BeliefStore for InMemoryBeliefStore {
    async fn add_belief(
        &self,
        key: &str,
        value: Value,
        confidence: f64,
        source: BeliefSource,
    ) -> Result<()> {
        debug!("belief '{}' updated (confidence {})", key, confidence);
        self.beliefs.write().await.insert(
            key.to_string(),
            Belief {
                value,
                confidence,
                source,
                updated_at: Local::now(),
            },
        );
        Ok(())
    }

    async fn get_belief(&self, key: &str) -> Option<Belief> {
        self.beliefs.read().await.get(key).cloned()
    }
}
