//! Interaction router and default handlers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use axon_config::KernelConfig;
use axon_tools::ToolRegistry;

use crate::events::EventBus;
use crate::gate::ConcurrencyGate;
use crate::interaction::{Interaction, InteractionStatus, InteractionType};
use crate::registry::AgentRegistry;
use crate::{KernelError, Result};

/// Tool id the component improvement path is routed to
pub const SELF_IMPROVEMENT_TOOL: &str = "self_improvement";

/// Processes one kind of interaction to a terminal status
///
/// The handler owns the terminal outcome: it calls `complete` or `fail` on
/// the interaction. An `Err` return is caught by the router and recorded as
/// a failure; it never propagates to the caller of `process`.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(&self, interaction: &mut Interaction) -> Result<()>;
}

type InteractionTable = Arc<RwLock<HashMap<String, Interaction>>>;

/// The coordination kernel: router plus the shared services behind it
pub struct Kernel {
    agents: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
    events: Arc<EventBus>,
    gate: Arc<ConcurrencyGate>,
    interactions: InteractionTable,
    handlers: HashMap<InteractionType, Arc<dyn InteractionHandler>>,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        Self::with_tools(config, ToolRegistry::new())
    }

    /// Build a kernel around an existing tool registry
    pub fn with_tools(config: KernelConfig, tools: ToolRegistry) -> Self {
        let agents = Arc::new(AgentRegistry::new());
        let tools = Arc::new(tools);
        let events = Arc::new(EventBus::new());
        let gate = Arc::new(ConcurrencyGate::new(config.max_concurrent_heavy_tasks));
        let interactions: InteractionTable = Arc::new(RwLock::new(HashMap::new()));

        let mut handlers: HashMap<InteractionType, Arc<dyn InteractionHandler>> = HashMap::new();
        handlers.insert(
            InteractionType::SystemAnalysis,
            Arc::new(SystemAnalysisHandler {
                agents: agents.clone(),
                gate: gate.clone(),
                interactions: interactions.clone(),
            }),
        );
        handlers.insert(
            InteractionType::ComponentImprovement,
            Arc::new(ComponentImprovementHandler {
                tools: tools.clone(),
                gate: gate.clone(),
            }),
        );
        handlers.insert(
            InteractionType::AgentRegistration,
            Arc::new(AgentRegistrationHandler { agents: agents.clone() }),
        );
        handlers.insert(
            InteractionType::PublishEvent,
            Arc::new(PublishEventHandler { events: events.clone() }),
        );
        // Query has no default handler; orchestrators register their own.

        info!(
            "kernel online (gate capacity {}, {} default handlers)",
            gate.capacity(),
            handlers.len()
        );

        Self {
            agents,
            tools,
            events,
            gate,
            interactions,
            handlers,
        }
    }

    pub fn agents(&self) -> Arc<AgentRegistry> {
        self.agents.clone()
    }

    pub fn tools(&self) -> Arc<ToolRegistry> {
        self.tools.clone()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn gate(&self) -> Arc<ConcurrencyGate> {
        self.gate.clone()
    }

    /// Install a handler for an interaction type; a second registration for
    /// the same type is an error.
    pub fn register_handler(
        &mut self,
        kind: InteractionType,
        handler: Arc<dyn InteractionHandler>,
    ) -> Result<()> {
        if self.handlers.contains_key(&kind) {
            return Err(KernelError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Create a tracked interaction in Pending state
    pub async fn create_interaction(
        &self,
        kind: InteractionType,
        content: impl Into<String>,
        metadata: serde_json::Map<String, Value>,
    ) -> Interaction {
        let interaction = Interaction::new(kind, content, metadata);
        debug!("created interaction {}", interaction.interaction_id);
        self.interactions
            .write()
            .await
            .insert(interaction.interaction_id.clone(), interaction.clone());
        interaction
    }

    /// Look up the tracked copy of an interaction
    pub async fn interaction(&self, interaction_id: &str) -> Option<Interaction> {
        self.interactions.read().await.get(interaction_id).cloned()
    }

    pub async fn in_progress_count(&self) -> usize {
        self.interactions
            .read()
            .await
            .values()
            .filter(|i| i.status == InteractionStatus::InProgress)
            .count()
    }

    /// Route one interaction through its handler to a terminal status
    ///
    /// Only Pending interactions are processed; anything else is returned
    /// unchanged. Handler errors are recorded on the interaction, never
    /// propagated.
    pub async fn process(&self, mut interaction: Interaction) -> Interaction {
        if interaction.status != InteractionStatus::Pending {
            warn!(
                "refusing to process {} in state {:?}",
                interaction.interaction_id, interaction.status
            );
            return interaction;
        }

        interaction.status = InteractionStatus::InProgress;
        self.track(&interaction).await;
        info!(
            "processing {} ({:?})",
            interaction.interaction_id, interaction.kind
        );

        match self.handlers.get(&interaction.kind) {
            None => {
                interaction.fail(format!(
                    "no handler registered for interaction type {:?}",
                    interaction.kind
                ));
            }
            Some(handler) => {
                let handler = handler.clone();
                if let Err(e) = handler.handle(&mut interaction).await {
                    error!("handler for {} failed: {}", interaction.interaction_id, e);
                    interaction.fail(e.to_string());
                }
            }
        }

        // A handler that returned Ok without settling the interaction still
        // gets a completion stamp.
        if interaction.completed_at.is_none() {
            interaction.completed_at = Some(chrono::Local::now());
        }

        self.track(&interaction).await;
        interaction
    }

    async fn track(&self, interaction: &Interaction) {
        self.interactions
            .write()
            .await
            .insert(interaction.interaction_id.clone(), interaction.clone());
    }
}

/// Raw system telemetry: registered agents, router load, gate occupancy
struct SystemAnalysisHandler {
    agents: Arc<AgentRegistry>,
    gate: Arc<ConcurrencyGate>,
    interactions: InteractionTable,
}

#[async_trait]
impl InteractionHandler for SystemAnalysisHandler {
    async fn handle(&self, interaction: &mut Interaction) -> Result<()> {
        let in_progress = self
            .interactions
            .read()
            .await
            .values()
            .filter(|i| i.status == InteractionStatus::InProgress)
            .count();

        let telemetry = json!({
            "registered_agents": self.agents.ids().await,
            "in_progress_interactions": in_progress,
            "gate_capacity": self.gate.capacity(),
            "gate_available": self.gate.available(),
        });

        interaction.complete(json!({ "status": "SUCCESS", "telemetry": telemetry }));
        Ok(())
    }
}

/// Heavy path: routes to the self-improvement tool under the gate
struct ComponentImprovementHandler {
    tools: Arc<ToolRegistry>,
    gate: Arc<ConcurrencyGate>,
}

#[async_trait]
impl InteractionHandler for ComponentImprovementHandler {
    async fn handle(&self, interaction: &mut Interaction) -> Result<()> {
        // Checked before the gate so a misconfigured kernel fails fast
        // without consuming a slot.
        if !self.tools.has(SELF_IMPROVEMENT_TOOL) {
            interaction.fail(format!(
                "component improvement requires the '{}' tool, which is not registered",
                SELF_IMPROVEMENT_TOOL
            ));
            return Ok(());
        }

        interaction.status = InteractionStatus::RoutedToTool;
        let _permit = self.gate.acquire().await?;
        debug!(
            "{} holds a gate slot ({} free)",
            interaction.interaction_id,
            self.gate.available()
        );

        let params = Value::Object(interaction.metadata.clone());
        let outcome = self.tools.execute(SELF_IMPROVEMENT_TOOL, params).await?;

        if outcome.is_success() {
            interaction.complete(outcome.to_value());
        } else {
            let reason = outcome
                .message
                .clone()
                .unwrap_or_else(|| "improvement tool reported failure".to_string());
            interaction.fail(reason);
        }
        Ok(())
    }
}

/// Adds or refreshes an agent record from interaction metadata
struct AgentRegistrationHandler {
    agents: Arc<AgentRegistry>,
}

#[async_trait]
impl InteractionHandler for AgentRegistrationHandler {
    async fn handle(&self, interaction: &mut Interaction) -> Result<()> {
        let field = |key: &str| -> Option<String> {
            interaction
                .metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let (agent_id, agent_type, description) =
            match (field("agent_id"), field("agent_type"), field("description")) {
                (Some(id), Some(kind), Some(desc)) => (id, kind, desc),
                _ => {
                    interaction.fail(
                        "agent registration requires metadata fields \
                         'agent_id', 'agent_type', and 'description'",
                    );
                    return Ok(());
                }
            };

        let record = self.agents.register(agent_id, agent_type, description).await;
        let response = serde_json::to_value(&record)
            .map_err(|e| KernelError::Handler(format!("record not serializable: {}", e)))?;
        interaction.complete(json!({ "status": "SUCCESS", "agent": response }));
        Ok(())
    }
}

/// Publishes metadata-described events onto the bus
struct PublishEventHandler {
    events: Arc<EventBus>,
}

#[async_trait]
impl InteractionHandler for PublishEventHandler {
    async fn handle(&self, interaction: &mut Interaction) -> Result<()> {
        let topic = match interaction.metadata.get("topic").and_then(Value::as_str) {
            Some(topic) => topic.to_string(),
            None => {
                interaction.fail("event publication requires a string 'topic' in metadata");
                return Ok(());
            }
        };
        let data = match interaction.metadata.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => {
                interaction.fail("event publication requires an object 'data' in metadata");
                return Ok(());
            }
        };

        let delivered = self.events.publish(&topic, data).await;
        interaction.complete(json!({
            "status": "SUCCESS",
            "topic": topic,
            "delivered": delivered,
        }));
        Ok(())
    }
}
