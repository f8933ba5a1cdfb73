//! Agent registry

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// One registered agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub agent_type: String,
    pub description: String,
    pub status: String,
    pub registered_at: DateTime<Local>,
}

/// Upsert-only registry of known agents; entries are never removed
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRecord>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or update an agent; re-registration refreshes the record
    pub async fn register(
        &self,
        agent_id: impl Into<String>,
        agent_type: impl Into<String>,
        description: impl Into<String>,
    ) -> AgentRecord {
        let record = AgentRecord {
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            description: description.into(),
            status: "active".to_string(),
            registered_at: Local::now(),
        };

        info!("agent '{}' registered ({})", record.agent_id, record.agent_type);
        self.agents
            .write()
            .await
            .insert(record.agent_id.clone(), record.clone());
        record
    }

    pub async fn get(&self, agent_id: &str) -> Option<AgentRecord> {
        self.agents.read().await.get(agent_id).cloned()
    }

    /// All records, sorted by agent id
    pub async fn agents(&self) -> Vec<AgentRecord> {
        let mut records: Vec<AgentRecord> = self.agents.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        records
    }

    pub async fn ids(&self) -> Vec<String> {
        self.agents().await.into_iter().map(|r| r.agent_id).collect()
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = AgentRegistry::new();
        registry
            .register("bdi_docs", "bdi", "documentation agent")
            .await;

        let record = registry.get("bdi_docs").await.unwrap();
        assert_eq!(record.agent_type, "bdi");
        assert_eq!(record.status, "active");
    }

    #[tokio::test]
    async fn test_reregistration_updates_in_place() {
        let registry = AgentRegistry::new();
        registry.register("a1", "bdi", "first").await;
        registry.register("a1", "bdi", "second").await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get("a1").await.unwrap().description, "second");
    }

    #[tokio::test]
    async fn test_listing_is_sorted() {
        let registry = AgentRegistry::new();
        registry.register("zeta", "bdi", "").await;
        registry.register("alpha", "bdi", "").await;

        assert_eq!(registry.ids().await, vec!["alpha", "zeta"]);
    }
}
