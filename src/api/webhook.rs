//! Webhook handler for GitLab events

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State as AxumState},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::dispatcher::DispatchOutcome;
use crate::event::EVENT_HEADER;

/// Header carrying the secret token configured on the GitLab webhook
pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Handles the GitLab webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let request_id = Uuid::now_v7();
    let label = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let span = info_span!(
        "webhook",
        %request_id,
        %remote,
        event = label.as_deref().unwrap_or("-")
    );

    async move {
        if let Some(expected) = &state.config.webhook.secret_token {
            let supplied = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
            if supplied != Some(expected.as_str()) {
                error!(
                    "Rejected webhook: {} header missing or wrong",
                    TOKEN_HEADER
                );
                return (StatusCode::UNAUTHORIZED, "Invalid token".to_string());
            }
        }

        let outcome = state.dispatcher.handle(label.as_deref(), &body).await;
        match &outcome {
            DispatchOutcome::Delivered => {
                info!("Notification delivered");
            }
            DispatchOutcome::DeliveryFailed(e) => {
                error!("Notification delivery failed: {}", e);
            }
            DispatchOutcome::Skipped { status } => {
                info!("Pipeline status {:?} has no notification, skipping.", status);
            }
            DispatchOutcome::Rejected { status, reason } => {
                warn!("Rejected webhook with {}: {}", status, reason);
            }
        }

        (outcome.status_code(), outcome.body())
    }
    .instrument(span)
    .await
}
