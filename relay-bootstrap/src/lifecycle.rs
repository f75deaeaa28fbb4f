use std::time::Duration;

use anyhow::{bail, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use relay_domain::GameCommand;
use relay_infrastructure::{schedule_retention, start_relay, AppConfig, GatewayClient};
use relay_interfaces_http::build_router_with_layers;

use crate::context::{GatewayContext, RelayContext};

const ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Ingestion gateway: HTTP surface plus the daily retention sweeps.
pub async fn run_gateway() -> Result<()> {
    let context = GatewayContext::new().await?;
    let state = context.state;

    let sweeps = schedule_retention(state.clone());

    let app = build_router_with_layers(state.clone());
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    stop_tasks(sweeps);
    info!("gateway stopped");
    Ok(())
}

/// Bot-side relay: panel loop and feed watchers until a shutdown signal.
pub async fn run_relay() -> Result<()> {
    let context = RelayContext::new().await?;
    let tasks = start_relay(context.state);
    shutdown_signal().await;
    stop_tasks(tasks);
    info!("relay stopped");
    Ok(())
}

/// Queues an in-game announcement on a running gateway.
pub async fn run_announce(message: String) -> Result<()> {
    let command = GameCommand::announce(message);
    if command.is_blank() {
        bail!("announcement message must not be empty");
    }
    let config = AppConfig::load().await?;
    config.validate_for_client()?;
    let client = GatewayClient::new(&config.to_client_config(), ANNOUNCE_TIMEOUT)?;
    let queue_length = client.queue_command(&command).await?;
    info!(queue_length, "announcement queued");
    Ok(())
}

fn stop_tasks(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        task.abort();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
