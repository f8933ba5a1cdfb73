//! Plans: validation and the current intention

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use axon_tools::ToolRegistry;

use crate::actions::{ActionRegistry, EXECUTE_TOOL};
use crate::goals::Goal;
use crate::{short_id, BdiError, Result};

/// Status of the current intention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    None,
    Ready,
    Executing,
    Completed,
    Failed,
}

/// One step of an installed plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub params: Value,
}

/// A validated plan step, before installation assigns action ids
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub kind: String,
    pub params: Value,
}

/// The currently installed plan pursuing one goal
///
/// Consumed destructively: executed actions are popped from the front.
/// Status only moves forward; a completed or failed intention is replaced
/// wholesale, never rewound.
#[derive(Debug, Clone)]
pub struct Intention {
    pub plan_id: Option<String>,
    pub goal_id: Option<String>,
    pub actions: VecDeque<Action>,
    pub status: PlanStatus,
}

impl Intention {
    /// The empty intention
    pub fn none() -> Self {
        Self {
            plan_id: None,
            goal_id: None,
            actions: VecDeque::new(),
            status: PlanStatus::None,
        }
    }

    /// Install a validated plan as the new intention, status Ready
    pub fn install(steps: Vec<PlanStep>, goal_id: &str) -> Self {
        let plan_id = format!("plan_{}", short_id());
        let actions: VecDeque<Action> = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| Action {
                id: format!("act_{}_{}", plan_id, i + 1),
                kind: step.kind,
                params: step.params,
            })
            .collect();

        info!(
            "installed intention '{}' with {} actions for goal '{}'",
            plan_id,
            actions.len(),
            goal_id
        );

        Self {
            plan_id: Some(plan_id),
            goal_id: Some(goal_id.to_string()),
            actions,
            status: PlanStatus::Ready,
        }
    }

    pub fn is_for_goal(&self, goal_id: &str) -> bool {
        self.goal_id.as_deref() == Some(goal_id)
    }
}

impl Default for Intention {
    fn default() -> Self {
        Self::none()
    }
}

/// Build the oracle prompt for plan generation
pub fn planning_prompt(
    agent_id: &str,
    domain: &str,
    goal: &Goal,
    actions: &ActionRegistry,
    tools: &ToolRegistry,
) -> String {
    let action_tags = actions.tags().join(", ");
    let tool_manifest = {
        let manifest = tools.manifest();
        if manifest.is_empty() {
            "No external tools available.".to_string()
        } else {
            manifest
        }
    };

    format!(
        "You are a meticulous planning assistant for agent '{agent_id}' in domain '{domain}'.\n\
         Primary Goal: \"{goal}\"\n\n\
         Generate a step-by-step plan. You MUST use ONLY these action types:\n{action_tags}\n\n\
         If a step needs an external tool, use the `EXECUTE_TOOL` action. Its `params` must \
         include a `tool_id` and a `command` key naming the tool's sub-command.\n\
         Available tools:\n{tool_manifest}\n\n\
         Respond ONLY with a valid JSON list of action objects. Each action must have \
         'type' and 'params' keys.",
        goal = goal.description,
    )
}

/// Validate an oracle-produced plan against the registries
///
/// All-or-nothing: any violation rejects the whole plan and names the
/// offending step. Steps are 1-based in error messages.
pub fn validate_plan(
    raw: &Value,
    actions: &ActionRegistry,
    tools: &ToolRegistry,
) -> Result<Vec<PlanStep>> {
    let steps = raw
        .as_array()
        .ok_or_else(|| BdiError::InvalidPlan("plan must be a list".to_string()))?;
    if steps.is_empty() {
        return Err(BdiError::InvalidPlan("plan must be a non-empty list".to_string()));
    }

    let mut validated = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let n = i + 1;

        let kind = step
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(n, "missing 'type'"))?;
        let params = step
            .get("params")
            .ok_or_else(|| malformed(n, "missing 'params'"))?;
        if !params.is_object() {
            return Err(malformed(n, "'params' must be an object"));
        }

        if !actions.has(kind) {
            return Err(BdiError::InvalidPlan(format!(
                "step {} uses unknown action type '{}'",
                n, kind
            )));
        }

        if kind == EXECUTE_TOOL {
            let tool_id = params
                .get("tool_id")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(n, "EXECUTE_TOOL is missing 'tool_id'"))?;
            if !tools.has(tool_id) {
                return Err(BdiError::InvalidPlan(format!(
                    "step {} references unavailable tool '{}'",
                    n, tool_id
                )));
            }
            if params.get("command").is_none() {
                return Err(malformed(n, "EXECUTE_TOOL is missing 'command'"));
            }
        }

        validated.push(PlanStep {
            kind: kind.to_string(),
            params: params.clone(),
        });
    }

    Ok(validated)
}

fn malformed(step: usize, reason: &str) -> BdiError {
    BdiError::InvalidPlan(format!("step {} is malformed: {}", step, reason))
}
