use tracing::info;

use super::{Notifier, NotifyError};
use crate::notification::Notification;

/// Dry-run notifier: writes the rendered message to the log instead of chat
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            title = %notification.title,
            color = notification.color.hex(),
            fields = notification.fields.len(),
            "[DRY_RUN] Would send notification:\n{}",
            notification.text
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
