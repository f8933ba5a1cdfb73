//! Path utilities for Axon's on-disk layout

use std::path::PathBuf;

/// Axon data directory (~/.axon)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("failed to locate home directory")
        .join(".axon")
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Agent workspace location
pub fn workspace_path() -> PathBuf {
    data_dir().join("workspace")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
