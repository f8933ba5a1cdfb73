//! Agent run loop
//!
//! Deliberate, plan, execute, repeat, bounded by a cycle budget. One agent
//! instance owns its goal queue, intention, and status outright; everything
//! shared (oracle, tools, beliefs) is an injected collaborator. The loop is
//! single-threaded cooperative: its suspension points are the oracle call,
//! tool invocations, and the inter-cycle pacing delay.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use axon_config::BdiConfig;
use axon_oracle::{GenerateRequest, Oracle};
use axon_tools::ToolRegistry;

use crate::actions::{ActionHandler, ActionRegistry};
use crate::beliefs::BeliefStore;
use crate::goals::{Goal, GoalQueue};
use crate::plan::{planning_prompt, validate_plan, Intention, PlanStatus};
use crate::{BdiError, Result};

/// Lifecycle states of the agent run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Uninitialized,
    Initialized,
    Running,
    Planning,
    ExecutingAction,
    IdleComplete,
    GoalAchieved,
    FailedInitialization,
    FailedPlanning,
    FailedAction,
    FailedUnrecoverable,
    TimedOut,
}

impl AgentStatus {
    /// Whether a run can end in this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::IdleComplete
                | AgentStatus::GoalAchieved
                | AgentStatus::FailedInitialization
                | AgentStatus::FailedPlanning
                | AgentStatus::FailedAction
                | AgentStatus::FailedUnrecoverable
                | AgentStatus::TimedOut
        )
    }
}

enum CycleOutcome {
    Continue,
    Halt,
}

/// A tactical BDI agent instance
pub struct BdiAgent {
    agent_id: String,
    domain: String,
    config: BdiConfig,
    oracle: Arc<dyn Oracle>,
    tools: Arc<ToolRegistry>,
    actions: ActionRegistry,
    desires: GoalQueue,
    intention: Intention,
    status: AgentStatus,
    stop: CancellationToken,
}

impl BdiAgent {
    pub fn new(
        domain: impl Into<String>,
        oracle: Arc<dyn Oracle>,
        tools: ToolRegistry,
        beliefs: Arc<dyn BeliefStore>,
    ) -> Self {
        Self::with_config(domain, oracle, tools, beliefs, BdiConfig::default())
    }

    pub fn with_config(
        domain: impl Into<String>,
        oracle: Arc<dyn Oracle>,
        tools: ToolRegistry,
        beliefs: Arc<dyn BeliefStore>,
        config: BdiConfig,
    ) -> Self {
        let domain = domain.into();
        let agent_id = format!("bdi_{}", domain);
        let tools = Arc::new(tools);
        let actions = ActionRegistry::with_builtins(oracle.clone(), beliefs, tools.clone());

        Self {
            agent_id,
            domain,
            config,
            oracle,
            tools,
            actions,
            desires: GoalQueue::new(),
            intention: Intention::none(),
            status: AgentStatus::Uninitialized,
            stop: CancellationToken::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn intention(&self) -> &Intention {
        &self.intention
    }

    pub fn desires(&self) -> &GoalQueue {
        &self.desires
    }

    /// Token callers hold to request a stop; honored at the next
    /// inter-cycle boundary.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn set_primary_goal(&mut self, description: impl Into<String>) -> Goal {
        self.desires.set_primary_goal(description)
    }

    pub fn add_goal(&mut self, description: impl Into<String>, priority: i32) -> Goal {
        self.desires.add_goal(description, priority)
    }

    /// Inject a domain-specific action handler; collides with an existing
    /// tag as an error.
    pub fn register_action(&mut self, handler: Arc<dyn ActionHandler>) -> Result<()> {
        self.actions.register(handler)
    }

    /// Acquire collaborator handles; failure is terminal for the run
    pub async fn initialize(&mut self) -> Result<()> {
        if self.status != AgentStatus::Uninitialized {
            return Ok(());
        }

        if !self.oracle.is_configured() {
            return Err(BdiError::Initialization(format!(
                "oracle backend '{}' is not configured",
                self.oracle.name()
            )));
        }

        info!(
            "agent {} initialized (oracle: {}, tools: {:?})",
            self.agent_id,
            self.oracle.name(),
            self.tools.ids()
        );
        self.status = AgentStatus::Initialized;
        Ok(())
    }

    /// The main BDI execution loop; returns the terminal status
    pub async fn run(&mut self, max_cycles: u32) -> AgentStatus {
        if self.status == AgentStatus::Uninitialized {
            if let Err(e) = self.initialize().await {
                error!("agent {} failed to initialize: {}", self.agent_id, e);
                self.status = AgentStatus::FailedInitialization;
                return self.status;
            }
        }

        self.status = AgentStatus::Running;
        info!("agent {} starting run, max cycles {}", self.agent_id, max_cycles);

        for cycle in 1..=max_cycles {
            if self.stop.is_cancelled() {
                info!("agent {} stop requested, halting run", self.agent_id);
                break;
            }

            self.status = AgentStatus::Running;
            debug!("agent {} cycle {}/{}", self.agent_id, cycle, max_cycles);

            match self.run_cycle().await {
                Ok(CycleOutcome::Continue) => {}
                Ok(CycleOutcome::Halt) => break,
                Err(e) => {
                    error!("agent {} unrecoverable cycle error: {}", self.agent_id, e);
                    self.status = AgentStatus::FailedUnrecoverable;
                    break;
                }
            }

            // Pacing delay, cancellable: a stop during the wait is honored here.
            tokio::select! {
                _ = self.stop.cancelled() => {
                    info!("agent {} stop requested during pacing", self.agent_id);
                    break;
                }
                _ = tokio::time::sleep(std::time::Duration::from_millis(self.config.cycle_delay_ms)) => {}
            }
        }

        // An external stop zeroes the remaining budget, so it lands here too.
        if self.status == AgentStatus::Running {
            self.status = AgentStatus::TimedOut;
        }

        info!(
            "agent {} run finished with status {:?}",
            self.agent_id, self.status
        );
        self.status
    }

    async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let goal = match self.desires.deliberate() {
            Some(goal) => goal.clone(),
            None => {
                info!("agent {} has no pending goals", self.agent_id);
                self.status = AgentStatus::IdleComplete;
                return Ok(CycleOutcome::Halt);
            }
        };

        if !self.intention.is_for_goal(&goal.id) {
            self.status = AgentStatus::Planning;
            match self.plan(&goal).await {
                Ok(intention) => self.intention = intention,
                Err(e) => {
                    error!("agent {} planning failed: {}", self.agent_id, e);
                    self.status = AgentStatus::FailedPlanning;
                    return Ok(CycleOutcome::Halt);
                }
            }
        }

        if matches!(self.intention.status, PlanStatus::Ready | PlanStatus::Executing) {
            self.status = AgentStatus::ExecutingAction;
            if !self.execute_next_action().await {
                self.status = AgentStatus::FailedAction;
                return Ok(CycleOutcome::Halt);
            }
        }

        if self.intention.status == PlanStatus::Completed {
            if !self.desires.mark_complete(&goal.id) {
                return Err(BdiError::State(format!(
                    "completed goal '{}' is missing from the queue",
                    goal.id
                )));
            }
            self.intention = Intention::none();

            if goal.is_primary {
                info!("agent {} achieved its primary goal", self.agent_id);
                self.status = AgentStatus::GoalAchieved;
                return Ok(CycleOutcome::Halt);
            }
        }

        Ok(CycleOutcome::Continue)
    }

    /// Generate and validate a plan for the goal, installing it on success
    async fn plan(&self, goal: &Goal) -> Result<Intention> {
        info!("agent {} planning for goal: {}", self.agent_id, goal.description);

        let prompt = planning_prompt(&self.agent_id, &self.domain, goal, &self.actions, &self.tools);
        let request = GenerateRequest::new(prompt)
            .with_task_hint("plan_generation")
            .with_temperature(0.1)
            .json_mode();

        let raw = self
            .oracle
            .generate(request)
            .await
            .map_err(|e| BdiError::Planning(format!("oracle call failed: {}", e)))?;

        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|e| BdiError::Planning(format!("plan is not valid JSON: {}", e)))?;

        let steps = validate_plan(&parsed, &self.actions, &self.tools)?;
        Ok(Intention::install(steps, &goal.id))
    }

    /// Run exactly one action from the front of the intention
    ///
    /// A no-op success when there is nothing runnable. Returns false only
    /// when the action failed, which aborts the plan: remaining actions are
    /// never run.
    pub async fn execute_next_action(&mut self) -> bool {
        if !matches!(self.intention.status, PlanStatus::Ready | PlanStatus::Executing) {
            return true;
        }
        let Some(action) = self.intention.actions.pop_front() else {
            return true;
        };

        self.intention.status = PlanStatus::Executing;
        info!(
            "agent {} executing action '{}' ({})",
            self.agent_id, action.kind, action.id
        );

        let result = match self.actions.get(&action.kind) {
            None => Err(format!("no handler for action type '{}'", action.kind)),
            Some(handler) => dispatch(handler, action.params.clone()).await,
        };

        match result {
            Ok(result) => {
                debug!(
                    "action '{}' succeeded: {:.150}",
                    action.kind,
                    result.to_string()
                );
                if self.intention.actions.is_empty() {
                    self.intention.status = PlanStatus::Completed;
                }
                true
            }
            Err(reason) => {
                error!("action '{}' failed: {}", action.kind, reason);
                self.intention.status = PlanStatus::Failed;
                false
            }
        }
    }
}

/// Run a handler on its own task so a panic inside it is converted into a
/// plain action failure instead of tearing down the run loop.
async fn dispatch(handler: Arc<dyn ActionHandler>, params: Value) -> crate::ActionResult {
    let joined = tokio::spawn(async move { handler.execute(&params).await }).await;
    match joined {
        Ok(result) => result,
        Err(e) => {
            warn!("action handler panicked: {}", e);
            Err(format!("handler panicked: {}", e))
        }
    }
}
