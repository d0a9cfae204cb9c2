//! Delivery of rendered notifications to a chat channel

pub mod log;
pub mod slack;

pub use log::LogNotifier;
pub use slack::SlackNotifier;

use crate::notification::Notification;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat API error: {0}")]
    Api(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Delivery capability shared by all webhook requests.
///
/// Implementations must tolerate concurrent `deliver` calls.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to the configured channel.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "slack").
    fn channel_name(&self) -> &str;
}
