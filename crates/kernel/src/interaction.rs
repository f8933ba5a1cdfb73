//! Interaction records routed through the kernel

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::short_id;

/// What kind of request an interaction carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Query,
    SystemAnalysis,
    ComponentImprovement,
    AgentRegistration,
    PublishEvent,
}

impl InteractionType {
    /// Stable lowercase tag, used in interaction ids
    pub fn slug(&self) -> &'static str {
        match self {
            InteractionType::Query => "query",
            InteractionType::SystemAnalysis => "system_analysis",
            InteractionType::ComponentImprovement => "component_improvement",
            InteractionType::AgentRegistration => "agent_registration",
            InteractionType::PublishEvent => "publish_event",
        }
    }
}

/// Lifecycle status of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Pending,
    InProgress,
    RoutedToTool,
    Completed,
    Failed,
}

/// One tracked request: created Pending, processed exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: String,
    pub kind: InteractionType,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub status: InteractionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Local>>,
}

impl Interaction {
    pub fn new(kind: InteractionType, content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            interaction_id: format!("inter_{}_{}", kind.slug(), short_id()),
            kind,
            content: content.into(),
            metadata,
            status: InteractionStatus::Pending,
            response: None,
            error: None,
            created_at: Local::now(),
            completed_at: None,
        }
    }

    /// Terminal success: records the response and stamps completion
    pub fn complete(&mut self, response: Value) {
        self.status = InteractionStatus::Completed;
        self.response = Some(response);
        self.completed_at = Some(Local::now());
    }

    /// Terminal failure: records the error and stamps completion
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = InteractionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Local::now());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            InteractionStatus::Completed | InteractionStatus::Failed
        )
    }
}
