//! Axon command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use axon_bdi::{BdiAgent, InMemoryBeliefStore};
use axon_config::{self, Config};
use axon_kernel::{InteractionType, Kernel};
use axon_oracle::{OpenRouterOracle, Oracle, ScriptedOracle};
use axon_tools::ToolRegistry;

/// Initialize config and workspace
pub async fn init_command() -> Result<()> {
    println!("Initializing axon...");

    let config = axon_config::init().await?;

    if config.has_api_key() {
        println!("\nAxon initialized, API key found.");
    } else {
        println!("\nAxon initialized.");
        println!("\nNext steps:");
        println!("  1. Add your API key to {}", axon_config::config_path().display());
        println!("     Get one at: https://openrouter.ai/keys");
        println!("  2. Run a goal: axon pursue -g \"summarize the workspace\"");
        println!("     (or try without credentials: axon pursue -g \"...\" --scripted)");
    }

    Ok(())
}

/// Run the agent against one goal to a terminal status
pub async fn pursue_command(goal: String, max_cycles: Option<u32>, scripted: bool) -> Result<()> {
    let config = Config::load().await?;

    let oracle: Arc<dyn Oracle> = if scripted {
        // Offline demo plan: think about the goal, then finish.
        let plan = json!([
            { "type": "THINK", "params": { "thought": "Work through the goal step by step." } },
            { "type": "NO_OP", "params": {} },
        ]);
        Arc::new(ScriptedOracle::always(plan.to_string()))
    } else {
        if !config.has_api_key() {
            anyhow::bail!(
                "no API key configured; set one in {} or pass --scripted",
                axon_config::config_path().display()
            );
        }
        Arc::new(OpenRouterOracle::new(
            config.oracle.api_key.clone(),
            config.oracle.api_base.clone(),
            Some(config.oracle.model.clone()),
        ))
    };

    let kernel = Kernel::new(config.kernel.clone());
    let mut agent = BdiAgent::with_config(
        "cli",
        oracle,
        ToolRegistry::new(),
        Arc::new(InMemoryBeliefStore::new()),
        config.bdi.clone(),
    );

    // Announce the agent to the kernel through the router.
    let registration = kernel
        .create_interaction(
            InteractionType::AgentRegistration,
            "cli agent registration",
            [
                ("agent_id".to_string(), json!(agent.agent_id())),
                ("agent_type".to_string(), json!("bdi")),
                ("description".to_string(), json!(goal.clone())),
            ]
            .into_iter()
            .collect(),
        )
        .await;
    let registration = kernel.process(registration).await;
    info!("registration finished as {:?}", registration.status);

    agent.set_primary_goal(&goal);
    let budget = max_cycles.unwrap_or(config.bdi.max_cycles);

    println!("Pursuing: {}", goal);
    let status = agent.run(budget).await;
    println!("Terminal status: {:?}", status);

    Ok(())
}

/// One-shot system analysis through the router
pub async fn status_command() -> Result<()> {
    let config = Config::load().await?;
    let kernel = Kernel::new(config.kernel.clone());

    let interaction = kernel
        .create_interaction(
            InteractionType::SystemAnalysis,
            "cli status",
            serde_json::Map::new(),
        )
        .await;
    let done = kernel.process(interaction).await;

    let response = done
        .response
        .context("system analysis returned no response")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&response["telemetry"]).unwrap_or_default()
    );

    Ok(())
}
