//! Slack Web API notifier.
//!
//! Posts each notification as a single message attachment through
//! `chat.postMessage`.

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{Notifier, NotifyError};
use crate::SlackConfig;
use crate::notification::{Notification, NotificationField};

/// Retry hint used when Slack rate limits without a `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Wire form of a notification in Slack's legacy attachment format
#[derive(Debug, Serialize)]
pub struct Attachment<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<&'a str>,
    pub text: &'a str,
    pub ts: i64,
    pub author_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<&'a str>,
    pub color: &'static str,
    #[serde(skip_serializing_if = "no_fields")]
    pub fields: &'a [NotificationField],
    pub mrkdwn_in: [&'static str; 1],
}

impl<'a> From<&'a Notification> for Attachment<'a> {
    fn from(n: &'a Notification) -> Self {
        Self {
            title: &n.title,
            title_link: n.title_link.as_deref(),
            text: &n.text,
            ts: n.timestamp.timestamp(),
            author_name: &n.author_name,
            author_icon: n.author_icon.as_deref(),
            color: n.color.hex(),
            fields: &n.fields,
            mrkdwn_in: ["text"],
        }
    }
}

fn no_fields(fields: &&[NotificationField]) -> bool {
    fields.is_empty()
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    as_user: bool,
    attachments: [Attachment<'a>; 1],
}

/// Sends notifications to one Slack channel with a bot token.
#[derive(Debug)]
pub struct SlackNotifier {
    token: String,
    channel: String,
    api_base: String,
    as_user: bool,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn from_config(config: &SlackConfig) -> Result<Self, NotifyError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NotifyError::Config("Slack token must not be empty".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            token,
            channel: config.channel().to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            as_user: config.as_user,
            client,
        })
    }

    fn request_body<'a>(&'a self, notification: &'a Notification) -> PostMessage<'a> {
        PostMessage {
            channel: &self.channel,
            as_user: self.as_user,
            attachments: [Attachment::from(notification)],
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.api_base);
        debug!(channel = %self.channel, title = %notification.title, "Sending Slack notification");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&self.request_body(notification))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(NotifyError::RateLimited { retry_after_secs });
        }

        let body: serde_json::Value = response.error_for_status()?.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) == Some(true) {
            debug!(channel = %self.channel, "Slack notification sent");
            return Ok(());
        }

        let error = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown Slack API error");
        Err(NotifyError::Api(error.to_string()))
    }

    fn channel_name(&self) -> &str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Color;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn config(token: Option<&str>) -> SlackConfig {
        SlackConfig {
            token: token.map(String::from),
            channel: Some("ci-alerts".to_string()),
            api_base: "https://slack.example.com/api/".to_string(),
            ..SlackConfig::default()
        }
    }

    fn notification() -> Notification {
        Notification {
            title: "Pipeline for group/relay".to_string(),
            title_link: Some("https://gitlab.example.com/group/relay/pipelines/7".to_string()),
            text: "Pipeline update:".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            author_name: "root".to_string(),
            author_icon: None,
            color: Color::BrightGreen,
            fields: vec![NotificationField {
                title: "Artifact for build".to_string(),
                value: "<https://x/download|Download (1.00 MiB)>".to_string(),
                short: false,
            }],
        }
    }

    #[test]
    fn empty_token_rejected() {
        for token in [None, Some("")] {
            let err = SlackNotifier::from_config(&config(token)).unwrap_err();
            assert!(err.to_string().contains("must not be empty"));
        }
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let notifier = SlackNotifier::from_config(&config(Some("xoxb-1"))).unwrap();
        assert_eq!(notifier.api_base, "https://slack.example.com/api");
        assert_eq!(notifier.channel_name(), "slack");
    }

    #[test]
    fn post_message_body_shape() {
        let notifier = SlackNotifier::from_config(&config(Some("xoxb-1"))).unwrap();
        let n = notification();
        let body = serde_json::to_value(notifier.request_body(&n)).unwrap();

        assert_eq!(
            body,
            json!({
                "channel": "ci-alerts",
                "as_user": true,
                "attachments": [{
                    "title": "Pipeline for group/relay",
                    "title_link": "https://gitlab.example.com/group/relay/pipelines/7",
                    "text": "Pipeline update:",
                    "ts": 1714557600,
                    "author_name": "root",
                    "color": "#00e676",
                    "fields": [{
                        "title": "Artifact for build",
                        "value": "<https://x/download|Download (1.00 MiB)>",
                        "short": false
                    }],
                    "mrkdwn_in": ["text"]
                }]
            })
        );
    }
}
