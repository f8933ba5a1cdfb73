//! BDI agent engine
//!
//! A goal-directed plan/execute engine: goals (desires) queue up, the oracle
//! proposes a plan for the selected goal, the validator gates it, and the
//! intention executor runs it action by action with fail-fast semantics. The
//! run loop ties these together as a bounded state machine.

use thiserror::Error;

pub mod actions;
pub mod agent;
pub mod beliefs;
pub mod goals;
pub mod plan;

pub use actions::{ActionHandler, ActionRegistry, ActionResult};
pub use agent::{AgentStatus, BdiAgent};
pub use beliefs::{Belief, BeliefSource, BeliefStore, InMemoryBeliefStore};
pub use goals::{Goal, GoalQueue, GoalStatus};
pub use plan::{validate_plan, Action, Intention, PlanStatus, PlanStep};

/// Engine errors
#[derive(Error, Debug)]
pub enum BdiError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("planning failed: {0}")]
    Planning(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("duplicate action type '{0}'")]
    DuplicateAction(String),

    #[error("belief store error: {0}")]
    Belief(String),

    #[error("inconsistent agent state: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, BdiError>;

pub(crate) fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..6].to_string()
}
