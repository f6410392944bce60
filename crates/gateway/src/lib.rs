//! WebSocket gateway for the Arachne task service.
//!
//! This crate accepts persistent client connections, runs each submitted
//! query through the plan/act/solve task graph, and bridges the graph's
//! tool calls back to the same client over the open socket.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `WS /ws` - Task bridge (`query`, `toolResponse` in; `plan`, `tool`,
//!   `result` out)
//!
//! # Architecture
//!
//! ```text
//! Client (CLI / embedded)
//!    │
//!    ▼  WebSocket
//! ┌─────────────────┐
//! │     Gateway     │ ◄── This crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          │ ToolDispatcher + EventSink
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │   Task graph    │ ──► │  Model tiers    │
//! │ plan→act→solve  │     │ (fast / strong) │
//! └─────────────────┘     └─────────────────┘
//! ```

pub mod bridge;
pub mod config;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::GatewayConfig;
pub use state::AppState;

/// Create the gateway router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/ws", get(routes::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting Arachne gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
