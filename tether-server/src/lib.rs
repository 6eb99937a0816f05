//! Rendezvous relay: pairs a host with one client under a short session code
//! and forwards their signaling messages to each other.

mod config;
mod error;
pub mod session;
pub mod signaling;

pub use config::ServerConfig;
pub use error::SignalingError;
pub use session::*;
pub use signaling::*;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

/// Bind `config.bind_addr` and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    serve_on(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    run(listener, SignalingService::new(), config).await
}

/// Serve `service` on `listener`, sweeping stale sessions in the background.
pub async fn run(
    listener: TcpListener,
    service: SignalingService,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let sweeper = spawn_sweeper(
        service.sessions(),
        config.sweep_interval,
        config.session_ttl,
    );

    let addr = listener.local_addr().context("listener has no local address")?;
    info!("Relay listening on ws://{}/ws", addr);

    let result = axum::serve(listener, router(service))
        .await
        .context("relay server stopped");
    sweeper.abort();
    result
}
