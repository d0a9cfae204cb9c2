use clap::Parser;
use gitlab_chat_relay::cli::Cli;
use gitlab_chat_relay::logging::setup_logging;
use gitlab_chat_relay::{AppState, api};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = match setup_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = match config.build_notifier() {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address.clone();
    info!(
        "Relaying to #{} via {}",
        config.slack.channel(),
        notifier.channel_name()
    );
    let state = Arc::new(AppState::new(config, notifier));
    let app = api::router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Serving forever on {}", bind_address);
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
