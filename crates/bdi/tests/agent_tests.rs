//! End-to-end run loop behavior against scripted collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use axon_bdi::{
    ActionHandler, ActionResult, AgentStatus, BdiAgent, InMemoryBeliefStore, PlanStatus,
};
use axon_config::BdiConfig;
use axon_oracle::{OpenRouterOracle, ScriptedOracle};
use axon_tools::{Outcome, ToolCapability, ToolRegistry};

fn fast_config() -> BdiConfig {
    BdiConfig {
        cycle_delay_ms: 0,
        ..BdiConfig::default()
    }
}

fn agent_with_oracle(oracle: ScriptedOracle, tools: ToolRegistry) -> BdiAgent {
    BdiAgent::with_config(
        "test",
        Arc::new(oracle),
        tools,
        Arc::new(InMemoryBeliefStore::new()),
        fast_config(),
    )
}

/// Counts invocations; fails on demand via params
struct CountingAction {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ActionHandler for CountingAction {
    fn tag(&self) -> &str {
        "COUNT"
    }

    async fn execute(&self, _params: &Value) -> ActionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!("counted"))
    }
}

/// Tool that records invocations and replays a canned outcome
struct RecordingTool {
    id: &'static str,
    calls: Arc<AtomicUsize>,
    outcome: Value,
}

#[async_trait]
impl ToolCapability for RecordingTool {
    fn id(&self) -> &str {
        self.id
    }

    fn description(&self) -> &str {
        "Records calls and replays a canned outcome"
    }

    async fn execute(&self, _params: Value) -> axon_tools::Result<Outcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Outcome::from_value(self.id, self.outcome.clone())
    }
}

#[tokio::test]
async fn test_no_pending_goal_is_idle_complete() {
    let mut agent = agent_with_oracle(ScriptedOracle::always("unused"), ToolRegistry::new());

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::IdleComplete);
}

#[tokio::test]
async fn test_unconfigured_oracle_fails_initialization() {
    let mut agent = BdiAgent::with_config(
        "test",
        Arc::new(OpenRouterOracle::new("", None, None)),
        ToolRegistry::new(),
        Arc::new(InMemoryBeliefStore::new()),
        fast_config(),
    );
    agent.set_primary_goal("anything");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedInitialization);
}

#[tokio::test]
async fn test_oracle_failure_is_failed_planning() {
    let mut agent = agent_with_oracle(
        ScriptedOracle::new().push_failure("backend down"),
        ToolRegistry::new(),
    );
    agent.set_primary_goal("do something");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedPlanning);
}

#[tokio::test]
async fn test_unparsable_plan_is_failed_planning() {
    let mut agent = agent_with_oracle(
        ScriptedOracle::always("this is not json"),
        ToolRegistry::new(),
    );
    agent.set_primary_goal("do something");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedPlanning);
    // Nothing was installed.
    assert_eq!(agent.intention().status, PlanStatus::None);
}

#[tokio::test]
async fn test_invalid_plan_installs_no_intention() {
    let plan = json!([{ "type": "NOT_A_REAL_ACTION", "params": {} }]);
    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent.set_primary_goal("do something");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedPlanning);
    assert_eq!(agent.intention().status, PlanStatus::None);
    assert!(agent.intention().actions.is_empty());
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_actions() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = json!([
        { "type": "COUNT", "params": {} },
        { "type": "FAIL", "params": { "reason": "deliberate stop" } },
        { "type": "COUNT", "params": {} },
    ]);

    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent
        .register_action(Arc::new(CountingAction { calls: calls.clone() }))
        .unwrap();
    agent.set_primary_goal("three step plan");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedAction);
    // Action 3 never ran.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.intention().status, PlanStatus::Failed);
}

#[tokio::test]
async fn test_write_file_scenario_achieves_goal() {
    let tool_calls = Arc::new(AtomicUsize::new(0));
    let mut tools = ToolRegistry::new();
    tools.register(RecordingTool {
        id: "fs",
        calls: tool_calls.clone(),
        outcome: json!({ "status": "SUCCESS" }),
    });

    let plan = json!([{
        "type": "EXECUTE_TOOL",
        "params": { "tool_id": "fs", "command": "write", "path": "a.txt", "content": "hi" }
    }]);
    let mut agent = agent_with_oracle(ScriptedOracle::always(plan.to_string()), tools);
    agent.set_primary_goal("write a file");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::GoalAchieved);
    assert_eq!(tool_calls.load(Ordering::SeqCst), 1);
    // The achieved goal is completed and never selected again.
    assert!(agent.desires().deliberate().is_none());
}

#[tokio::test]
async fn test_tool_error_outcome_fails_the_run() {
    let tool_calls = Arc::new(AtomicUsize::new(0));
    let mut tools = ToolRegistry::new();
    tools.register(RecordingTool {
        id: "fs",
        calls: tool_calls.clone(),
        outcome: json!({ "status": "ERROR", "message": "read-only filesystem" }),
    });

    let plan = json!([{
        "type": "EXECUTE_TOOL",
        "params": { "tool_id": "fs", "command": "write" }
    }]);
    let mut agent = agent_with_oracle(ScriptedOracle::always(plan.to_string()), tools);
    agent.set_primary_goal("write a file");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedAction);
}

#[tokio::test]
async fn test_cycle_budget_exhaustion_times_out() {
    // Five NO_OPs but only three cycles: three actions run and the budget
    // expires mid-plan.
    let plan = json!([
        { "type": "NO_OP", "params": {} },
        { "type": "NO_OP", "params": {} },
        { "type": "NO_OP", "params": {} },
        { "type": "NO_OP", "params": {} },
        { "type": "NO_OP", "params": {} },
    ]);
    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent.set_primary_goal("busywork");

    let status = agent.run(3).await;
    assert_eq!(status, AgentStatus::TimedOut);
    assert_eq!(agent.intention().status, PlanStatus::Executing);
}

#[tokio::test]
async fn test_stop_handle_halts_before_work() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = json!([{ "type": "COUNT", "params": {} }]);
    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent
        .register_action(Arc::new(CountingAction { calls: calls.clone() }))
        .unwrap();
    agent.set_primary_goal("never happens");

    agent.stop_handle().cancel();
    let status = agent.run(10).await;

    assert!(status.is_terminal());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_panicking_handler_is_an_action_failure() {
    struct PanicAction;

    #[async_trait]
    impl ActionHandler for PanicAction {
        fn tag(&self) -> &str {
            "PANIC"
        }
        async fn execute(&self, _params: &Value) -> ActionResult {
            panic!("handler bug");
        }
    }

    let plan = json!([{ "type": "PANIC", "params": {} }]);
    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent.register_action(Arc::new(PanicAction)).unwrap();
    agent.set_primary_goal("trip the handler");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::FailedAction);
}

#[tokio::test]
async fn test_duplicate_action_registration_is_an_error() {
    let mut agent = agent_with_oracle(ScriptedOracle::always("unused"), ToolRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));

    agent
        .register_action(Arc::new(CountingAction { calls: calls.clone() }))
        .unwrap();
    assert!(agent
        .register_action(Arc::new(CountingAction { calls }))
        .is_err());
}

#[tokio::test]
async fn test_secondary_goals_run_after_primary_replan() {
    // Primary goal completes with one NO_OP, then the secondary goal gets
    // its own plan. The run ends at GoalAchieved when the primary finishes,
    // so the secondary stays pending.
    let plan = json!([{ "type": "NO_OP", "params": {} }]);
    let mut agent = agent_with_oracle(
        ScriptedOracle::always(plan.to_string()),
        ToolRegistry::new(),
    );
    agent.add_goal("background chore", 10);
    agent.set_primary_goal("the mission");

    let status = agent.run(10).await;
    assert_eq!(status, AgentStatus::GoalAchieved);

    let remaining = agent.desires().deliberate().unwrap();
    assert_eq!(remaining.description, "background chore");
}
