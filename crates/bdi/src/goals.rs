//! Goal (desire) queue

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::short_id;

/// Goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Pending,
    Completed,
}

/// A described objective with priority and lifecycle status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub priority: i32,
    pub status: GoalStatus,
    pub created_at: DateTime<Local>,
    pub is_primary: bool,
}

impl Goal {
    fn new(description: impl Into<String>, priority: i32, is_primary: bool) -> Self {
        let prefix = if is_primary { "primary" } else { "goal" };
        Self {
            id: format!("{}_{}", prefix, short_id()),
            description: description.into(),
            priority,
            status: GoalStatus::Pending,
            created_at: Local::now(),
            is_primary,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == GoalStatus::Pending
    }
}

/// Priority for goals created through `set_primary_goal`
pub const PRIMARY_PRIORITY: i32 = 100;

/// Ordered set of pending goals
///
/// Goals are never removed, only marked completed. Sorted highest priority
/// first, ties broken by earliest creation.
#[derive(Debug, Default)]
pub struct GoalQueue {
    goals: Vec<Goal>,
}

impl GoalQueue {
    pub fn new() -> Self {
        Self { goals: Vec::new() }
    }

    /// Install a new primary goal, evicting any existing one from the queue
    pub fn set_primary_goal(&mut self, description: impl Into<String>) -> Goal {
        let goal = Goal::new(description, PRIMARY_PRIORITY, true);
        self.goals.retain(|g| !g.is_primary);
        self.goals.push(goal.clone());
        self.resort();
        info!("set primary goal '{}': {}", goal.id, goal.description);
        goal
    }

    /// Add a secondary goal with an explicit priority
    pub fn add_goal(&mut self, description: impl Into<String>, priority: i32) -> Goal {
        let goal = Goal::new(description, priority, false);
        self.goals.push(goal.clone());
        self.resort();
        goal
    }

    /// Select the first pending goal; no side effects
    pub fn deliberate(&self) -> Option<&Goal> {
        self.goals.iter().find(|g| g.is_pending())
    }

    /// Flip a goal to completed; returns false if the goal is unknown
    pub fn mark_complete(&mut self, goal_id: &str) -> bool {
        match self.goals.iter_mut().find(|g| g.id == goal_id) {
            Some(goal) => {
                goal.status = GoalStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// All goals in queue order, completed ones included
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    // Stable sort keeps insertion order among exact ties.
    fn resort(&mut self) {
        self.goals
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
    }
}
