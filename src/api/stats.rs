//! Root and status endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct ServerStats {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct RelayStats {
    pub notifier: String,
    pub channel: String,
    pub dry_run: bool,
    pub secret_token_required: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub server: ServerStats,
    pub relay: RelayStats,
}

pub async fn root() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " is running. POST GitLab webhooks to /webhook")
}

/// GET /status - server uptime and relay target
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<StatusResponse> {
    let config = &state.config;
    Json(StatusResponse {
        server: ServerStats {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            started_at: state.started_at.to_rfc3339(),
        },
        relay: RelayStats {
            notifier: state.dispatcher.notifier().channel_name().to_string(),
            channel: config.slack.channel().to_string(),
            dry_run: config.webhook.dry_run,
            secret_token_required: config.webhook.secret_token.is_some(),
        },
    })
}
