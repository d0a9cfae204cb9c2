//! Command-line flags; each can also come from the environment or `.env`

use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::{RelayConfig, load_config};

pub const DEFAULT_CONFIG_PATH: &str = "relay_config.toml";

/// Relay GitLab push, tag and pipeline webhooks to a Slack channel.
#[derive(Parser, Debug, Default)]
#[command(name = "gitlab_chat_relay", version, about)]
pub struct Cli {
    /// Path to a TOML config file (optional unless given explicitly).
    #[arg(long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Slack bot token.
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Slack channel to post to.
    #[arg(long, env = "SLACK_CHANNEL")]
    pub channel: Option<String>,

    /// Shared secret expected in the X-Gitlab-Token header.
    #[arg(long, env = "GITLAB_WEBHOOK_TOKEN", hide_env_values = true)]
    pub secret_token: Option<String>,

    /// Log notifications instead of sending them.
    #[arg(long, env = "RELAY_DRY_RUN")]
    pub dry_run: bool,

    /// Directory for rotating log files.
    #[arg(long, env = "RELAY_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Config file to read, and whether it must exist
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Overlay flags on top of file settings
    pub fn apply(self, config: &mut RelayConfig) {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(token) = self.token {
            config.slack.token = Some(token);
        }
        if let Some(channel) = self.channel {
            config.slack.channel = Some(channel);
        }
        if let Some(secret) = self.secret_token {
            config.webhook.secret_token = Some(secret);
        }
        if self.dry_run {
            config.webhook.dry_run = true;
        }
        if let Some(dir) = self.log_dir {
            config.logging.directory = Some(dir);
        }
    }

    /// Merge config file, environment and flags into one validated config.
    ///
    /// `${VAR}` references are resolved after the flags are applied, so a
    /// flag can stand in for a variable the file refers to.
    pub fn into_config(self) -> Result<RelayConfig> {
        let (config_path, required) = self.config_path();
        let mut config = load_config(&config_path, required)?;
        self.apply(&mut config);
        config.resolve_secrets()?;
        config.validate()?;
        Ok(config)
    }
}
