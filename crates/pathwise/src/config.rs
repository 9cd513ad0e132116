//! Configuration management for pathwise.
//!
//! Settings live in `pathwise.yaml` and can be overridden from the
//! environment, which takes precedence over the file:
//!
//! - `GROQ_API_KEY`, `GEMINI_API_KEY`: LLM provider credentials
//! - `NODE_API_URL`: base URL of the risk-alert notifier
//! - `RISK_ALERT_THRESHOLD`: notify when the score drops below this

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "pathwise.yaml";

/// Score below which a risk alert is sent
pub const DEFAULT_ALERT_THRESHOLD: u8 = 50;

/// Base URL of the risk-alert notifier
pub const DEFAULT_NOTIFIER_URL: &str = "http://localhost:5000";

/// Per-provider LLM request timeout
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Risk-alert request timeout
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const ENV_NOTIFIER_URL: &str = "NODE_API_URL";
const ENV_ALERT_THRESHOLD: &str = "RISK_ALERT_THRESHOLD";

/// Configuration file structure for pathwise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct PathwiseConfig {
    /// Send a risk alert when the score is strictly below this value
    pub alert_threshold: u8,

    /// Base URL of the risk-alert notifier
    pub notifier_url: String,

    /// Groq API key (primary dependency detector)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,

    /// Gemini API key (fallback dependency detector)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    /// Timeout for each LLM provider request, in seconds
    pub llm_timeout_secs: u64,

    /// Timeout for the risk-alert request, in seconds
    pub notify_timeout_secs: u64,
}

impl Default for PathwiseConfig {
    fn default() -> Self {
        Self {
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            notifier_url: DEFAULT_NOTIFIER_URL.to_string(),
            groq_api_key: None,
            gemini_api_key: None,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            notify_timeout_secs: DEFAULT_NOTIFY_TIMEOUT_SECS,
        }
    }
}

impl PathwiseConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, `pathwise.yaml` in `dir` is
    /// used when present and defaults otherwise. Environment overrides are
    /// applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be loaded.
    pub async fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path: Option<PathBuf> = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                fs::try_exists(&candidate)
                    .await
                    .unwrap_or(false)
                    .then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::load(&path).await?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process
    /// environment). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get(ENV_GROQ_API_KEY) {
            self.groq_api_key = Some(key);
        }
        if let Some(key) = get(ENV_GEMINI_API_KEY) {
            self.gemini_api_key = Some(key);
        }
        if let Some(url) = get(ENV_NOTIFIER_URL) {
            self.notifier_url = url;
        }
        if let Some(raw) = get(ENV_ALERT_THRESHOLD) {
            match raw.trim().parse::<u8>() {
                Ok(threshold) if threshold <= 100 => self.alert_threshold = threshold,
                _ => {
                    tracing::warn!(
                        env_var = ENV_ALERT_THRESHOLD,
                        value = %raw,
                        default = self.alert_threshold,
                        "Invalid value (expected 0-100), keeping current threshold"
                    );
                }
            }
        }
    }

    /// The Groq API key, if one is configured.
    pub fn groq_api_key(&self) -> Option<&str> {
        non_empty(self.groq_api_key.as_deref())
    }

    /// The Gemini API key, if one is configured.
    pub fn gemini_api_key(&self) -> Option<&str> {
        non_empty(self.gemini_api_key.as_deref())
    }

    /// Timeout for each LLM provider request.
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Timeout for the risk-alert request.
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Validate value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.alert_threshold > 100 {
            return Err(Error::Config(format!(
                "alert-threshold must be between 0 and 100, got {}",
                self.alert_threshold
            )));
        }
        if self.notifier_url.trim().is_empty() {
            return Err(Error::Config("notifier-url cannot be empty".to_string()));
        }
        if self.llm_timeout_secs == 0 || self.notify_timeout_secs == 0 {
            return Err(Error::Config("Timeouts must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
