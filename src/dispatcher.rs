//! Classify → render → deliver for a single webhook request
//!
//! The dispatcher never logs delivery failures or ignored events itself; it
//! reports them through [`DispatchOutcome`] so the HTTP layer decides how to
//! surface them to the operator.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::RelayError;
use crate::event::{EventKind, Resolved, classify};
use crate::notifier::Notifier;
use crate::render::render;

/// What happened to one webhook request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A notification was rendered and the notifier accepted it
    Delivered,
    /// A notification was rendered but the notifier failed; not the sender's problem
    DeliveryFailed(String),
    /// Pipeline status without a renderer; nothing was sent
    Skipped { status: String },
    /// The request itself was bad (or could not be rendered)
    Rejected { status: StatusCode, reason: String },
}

impl DispatchOutcome {
    fn rejected(err: RelayError) -> Self {
        DispatchOutcome::Rejected {
            status: err.status_code(),
            reason: err.to_string(),
        }
    }

    /// HTTP status returned to the webhook sender
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchOutcome::Rejected { status, .. } => *status,
            _ => StatusCode::OK,
        }
    }

    /// Response body returned to the webhook sender; empty when accepted
    pub fn body(&self) -> String {
        match self {
            DispatchOutcome::Rejected { reason, .. } => reason.clone(),
            _ => String::new(),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Handle one webhook: `label` is the raw `X-Gitlab-Event` header value.
    pub async fn handle(&self, label: Option<&str>, body: &[u8]) -> DispatchOutcome {
        let hook = match classify(label) {
            Ok(hook) => hook,
            Err(e) => return DispatchOutcome::rejected(e),
        };

        let payload: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => return DispatchOutcome::rejected(RelayError::InvalidPayload(e)),
        };

        let kind = match EventKind::resolve(hook, &payload) {
            Ok(Resolved::Render(kind)) => kind,
            Ok(Resolved::Ignored { status }) => return DispatchOutcome::Skipped { status },
            Err(e) => return DispatchOutcome::rejected(e),
        };

        let notification = match render(kind, &payload, Utc::now()) {
            Ok(n) => n,
            Err(e) => return DispatchOutcome::rejected(e),
        };
        debug!(?kind, title = %notification.title, "Rendered notification");

        match self.notifier.deliver(&notification).await {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => DispatchOutcome::DeliveryFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notification;
    use crate::notifier::NotifyError;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockNotifier {
        send_count: AtomicUsize,
        should_fail: bool,
        last: Mutex<Option<Notification>>,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(notification.clone());
            if self.should_fail {
                Err(NotifyError::Api("channel_not_found".to_string()))
            } else {
                Ok(())
            }
        }

        fn channel_name(&self) -> &str {
            "mock"
        }
    }

    fn dispatcher(should_fail: bool) -> (Dispatcher, Arc<MockNotifier>) {
        let mock = Arc::new(MockNotifier {
            should_fail,
            ..MockNotifier::default()
        });
        (Dispatcher::new(mock.clone()), mock)
    }

    fn pipeline_body(status: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "object_attributes": {
                "id": 12,
                "status": status,
                "created_at": "2024-05-01 10:00:00 UTC",
                "finished_at": "2024-05-01 10:05:00 UTC"
            },
            "user": { "username": "root" },
            "project": {
                "path_with_namespace": "group/relay",
                "web_url": "https://gitlab.example.com/group/relay"
            },
            "builds": [{ "id": 1, "name": "test", "stage": "test", "status": status }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn pending_pipeline_is_delivered() {
        let (dispatcher, mock) = dispatcher(false);
        let outcome = dispatcher
            .handle(Some("Pipeline Hook"), &pipeline_body("pending"))
            .await;

        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(outcome.status_code(), StatusCode::OK);
        assert_eq!(outcome.body(), "");
        assert_eq!(mock.send_count.load(Ordering::SeqCst), 1);
        let sent = mock.last.lock().unwrap().clone().unwrap();
        assert!(sent.text.starts_with("This pipeline has 1 build(s):"));
    }

    #[tokio::test]
    async fn unknown_pipeline_status_is_a_noop() {
        let (dispatcher, mock) = dispatcher(false);
        let outcome = dispatcher
            .handle(Some("Pipeline Hook"), &pipeline_body("archived"))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                status: "archived".to_string()
            }
        );
        assert_eq!(outcome.status_code(), StatusCode::OK);
        assert_eq!(mock.send_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_and_missing_labels_are_rejected() {
        let (dispatcher, mock) = dispatcher(false);

        let outcome = dispatcher.handle(Some("Frobnicate Hook"), b"{}").await;
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(outcome.body(), "Invalid event 'Frobnicate Hook'");

        let outcome = dispatcher.handle(None, b"{}").await;
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(outcome.body(), "Invalid event");

        assert_eq!(mock.send_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (dispatcher, _mock) = dispatcher(false);
        let outcome = dispatcher.handle(Some("Push Hook"), b"{not json").await;
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert!(outcome.body().starts_with("Invalid payload"));
    }

    #[tokio::test]
    async fn render_errors_are_server_errors() {
        let (dispatcher, mock) = dispatcher(false);
        let outcome = dispatcher
            .handle(Some("Push Hook"), br#"{"ref": "refs/heads/main"}"#)
            .await;

        assert_eq!(outcome.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.body(), "Missing required field 'user_username'");
        assert_eq!(mock.send_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delivery_failure_is_still_accepted() {
        let (dispatcher, mock) = dispatcher(true);
        let outcome = dispatcher
            .handle(Some("Pipeline Hook"), &pipeline_body("failed"))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::DeliveryFailed("Chat API error: channel_not_found".to_string())
        );
        assert_eq!(outcome.status_code(), StatusCode::OK);
        assert_eq!(outcome.body(), "");
        assert_eq!(mock.send_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let (dispatcher, mock) = dispatcher(false);
        let mut handles = Vec::new();
        for status in ["pending", "running", "success", "failed", "canceled"] {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher
                    .handle(Some("Pipeline Hook"), &pipeline_body(status))
                    .await
            }));
        }

        let mut delivered = 0;
        for handle in handles {
            if handle.await.unwrap() == DispatchOutcome::Delivered {
                delivered += 1;
            }
        }
        assert_eq!(delivered, 4);
        assert_eq!(mock.send_count.load(Ordering::SeqCst), 4);
    }
}
