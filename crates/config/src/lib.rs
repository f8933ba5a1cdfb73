//! Configuration management for Axon
//!
//! Loads and saves system parameters from a JSON file under ~/.axon.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, workspace_path};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Agent run loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BdiConfig {
    /// Pacing delay between run loop cycles, in milliseconds
    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,
    /// Cycle budget for a tactical run
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
    /// Cycle budget for strategic campaign runs
    #[serde(default = "default_strategic_max_cycles")]
    pub strategic_max_cycles: u32,
}

impl Default for BdiConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: default_cycle_delay_ms(),
            max_cycles: default_max_cycles(),
            strategic_max_cycles: default_strategic_max_cycles(),
        }
    }
}

fn default_cycle_delay_ms() -> u64 {
    100
}

fn default_max_cycles() -> u32 {
    50
}

fn default_strategic_max_cycles() -> u32 {
    25
}

/// Kernel service parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Capacity of the concurrency gate for heavy interactions
    #[serde(default = "default_max_concurrent_heavy_tasks")]
    pub max_concurrent_heavy_tasks: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_concurrent_heavy_tasks: default_max_concurrent_heavy_tasks(),
        }
    }
}

fn default_max_concurrent_heavy_tasks() -> usize {
    2
}

/// Plan oracle backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.1
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bdi: BdiConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl Config {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Whether an oracle API key is configured
    pub fn has_api_key(&self) -> bool {
        !self.oracle.api_key.is_empty()
    }
}

/// Initialize the data directory and write a default config if none exists
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("config already present at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("default config written to {:?}", config_path);
    }

    paths::ensure_dir(&workspace_path()).await?;

    Config::load().await
}
