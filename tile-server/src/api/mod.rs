//! HTTP/WebSocket API layer
//!
//! ## Architecture
//! ```text
//! Game client
//!       ↓ WebSocket upgrade on `/`, JSON text frames
//! Axum Router (port 5000)
//!       ↓
//! socket::handle_socket ── waits on WorldGate ──► ClientConnection
//!       ↓
//! SessionCoordinator (world grid + player registry)
//! ```
//!
//! ## Endpoints
//! - `GET /`             WebSocket game session
//! - `GET /health`       liveness and world readiness
//! - `GET /metrics/json` counter snapshot

pub mod socket;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::async_generation::WorldGate;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::metrics::ServerMetrics;

/// Shared state available to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolves to the coordinator once the world exists
    pub gate: WorldGate,
    /// Server-wide metrics (lock-free atomics)
    pub metrics: Arc<ServerMetrics>,
    pub config: Arc<ServerConfig>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    world_ready: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        world_ready: state.gate.try_get().is_some(),
    })
}

/// Build the full router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(socket::ws_handler))
        .route("/health", get(health_check))
        .route("/metrics/json", get(crate::metrics::json_metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("📡 Listening on ws://{}", listener.local_addr()?);
    serve(listener, state, shutdown).await
}
