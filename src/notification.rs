//! Rendered chat message, independent of the delivery channel

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Severity palette shown as the message's side bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Teal,
    Blue,
    Indigo,
    BrightGreen,
    Red,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::Green => "#00ff00",
            Color::Teal => "#26a69a",
            Color::Blue => "#1976d2",
            Color::Indigo => "#3f51b5",
            Color::BrightGreen => "#00e676",
            Color::Red => "#ff0000",
        }
    }
}

/// Extra titled entry below the message text (e.g. an artifact download)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationField {
    pub title: String,
    pub value: String,
    /// Whether the field may be laid out side by side with others
    pub short: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub title_link: Option<String>,
    /// Multi-line body using Slack's mrkdwn flavour
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    pub author_icon: Option<String>,
    pub color: Color,
    pub fields: Vec<NotificationField>,
}
