pub mod api;
pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod logging;
pub mod notification;
pub mod notifier;
pub mod payload;
pub mod render;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{RelayError, Result};
use crate::notifier::{LogNotifier, Notifier, SlackNotifier};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:6543";
pub const DEFAULT_CHANNEL: &str = "repo-report";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_LOG_FILES: usize = 5;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelayConfig {
    pub bind_address: String,
    pub slack: SlackConfig,
    pub webhook: WebhookConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot token; `${VAR}` is read from the environment
    pub token: Option<String>,
    /// Report channel; `repo-report` when unset
    pub channel: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
    pub as_user: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WebhookConfig {
    /// Expected `X-Gitlab-Token` value; unchecked when unset
    pub secret_token: Option<String>,
    /// Log rendered notifications instead of sending them
    pub dry_run: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotating log files; console only when unset
    pub directory: Option<PathBuf>,
    pub max_files: usize,
    pub rotation: LogRotation,
}

/// How often the log file is rolled over
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            slack: SlackConfig::default(),
            webhook: WebhookConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            channel: None,
            api_base: DEFAULT_SLACK_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            as_user: true,
        }
    }
}

impl SlackConfig {
    /// Channel notifications are posted to
    pub fn channel(&self) -> &str {
        self.channel.as_deref().unwrap_or(DEFAULT_CHANNEL)
    }

    /// Whether no channel was configured and the default applies
    pub fn uses_default_channel(&self) -> bool {
        self.channel.is_none()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_files: DEFAULT_MAX_LOG_FILES,
            rotation: LogRotation::default(),
        }
    }
}

impl RelayConfig {
    /// Parse a TOML document.
    ///
    /// `${VAR}` references are kept as written; call
    /// [`resolve_secrets`](Self::resolve_secrets) once flags have been applied.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Replace `${VAR}` references in secret settings with environment values
    pub fn resolve_secrets(&mut self) -> Result<()> {
        self.slack.token = self.slack.token.take().map(|t| resolve_env_var(&t)).transpose()?;
        self.webhook.secret_token = self
            .webhook
            .secret_token
            .take()
            .map(|t| resolve_env_var(&t))
            .transpose()?;
        Ok(())
    }

    /// Check settings that can't be expressed in the types
    pub fn validate(&self) -> Result<()> {
        if self.slack.channel().trim().is_empty() {
            return Err(RelayError::ConfigError(
                "Slack channel must not be empty".to_string(),
            ));
        }
        let has_token = self.slack.token.as_ref().is_some_and(|t| !t.is_empty());
        if !has_token && !self.webhook.dry_run {
            return Err(RelayError::ConfigError(
                "A Slack token is required (pass --token or set SLACK_TOKEN), or enable dry run"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Build the notifier this configuration asks for
    pub fn build_notifier(&self) -> Result<Arc<dyn Notifier>> {
        if self.webhook.dry_run {
            info!("Dry run enabled, notifications will only be logged");
            return Ok(Arc::new(LogNotifier));
        }
        let slack = SlackNotifier::from_config(&self.slack)
            .map_err(|e| RelayError::ConfigError(e.to_string()))?;
        Ok(Arc::new(slack))
    }
}

/// Resolve a `${VAR}` reference; any other value is returned unchanged
fn resolve_env_var(value: &str) -> Result<String> {
    let Some(rest) = value.strip_prefix("${") else {
        return Ok(value.to_string());
    };
    let var_name = rest.strip_suffix('}').ok_or_else(|| {
        RelayError::ConfigError(format!("Malformed env var reference: {}", value))
    })?;
    std::env::var(var_name).map_err(|_| {
        RelayError::ConfigError(format!("Environment variable '{}' is not set", var_name))
    })
}

/// Load the TOML config file.
///
/// A missing file is only an error when `required` is set, so the relay can
/// run from flags and environment alone.
pub fn load_config(path: &Path, required: bool) -> Result<RelayConfig> {
    if !path.exists() && !required {
        return Ok(RelayConfig::default());
    }

    let config_str = std::fs::read_to_string(path).map_err(|e| {
        RelayError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    RelayConfig::from_toml(&config_str).map_err(|e| {
        RelayError::ConfigError(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}

pub struct AppState {
    pub config: RelayConfig,
    pub dispatcher: Dispatcher,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RelayConfig, notifier: Arc<dyn Notifier>) -> Self {
        if config.slack.uses_default_channel() {
            warn!("Using default report channel {}", DEFAULT_CHANNEL);
        }
        Self {
            config,
            dispatcher: Dispatcher::new(notifier),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
