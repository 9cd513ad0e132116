//! Implementation of the `init` command.
//!
//! Writes a `pathwise.yaml` with default settings so they can be edited in
//! place. API keys are left out; they normally come from the environment.

use crate::config::{PathwiseConfig, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the written config file
    pub config_file: PathBuf,
    /// Whether an existing file was replaced
    pub overwritten: bool,
}

/// Check if a directory already has a configuration file.
pub async fn is_initialized(base_dir: &Path) -> bool {
    fs::try_exists(base_dir.join(CONFIG_FILE_NAME))
        .await
        .unwrap_or(false)
}

/// Write a default configuration file in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - `pathwise.yaml` already exists and `force` is not set
/// - File system operations fail
pub async fn init(base_dir: &Path, force: bool) -> Result<InitResult> {
    let config_file = base_dir.join(CONFIG_FILE_NAME);
    let exists = is_initialized(base_dir).await;

    if exists && !force {
        return Err(Error::Config(format!(
            "Pathwise is already initialized in this directory. Found existing '{CONFIG_FILE_NAME}' (use --force to overwrite)"
        )));
    }

    fs::create_dir_all(base_dir).await?;
    PathwiseConfig::default().save(&config_file).await?;
    tracing::info!(path = %config_file.display(), overwritten = exists, "Wrote configuration");

    Ok(InitResult {
        config_file,
        overwritten: exists,
    })
}
