// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use spout_core::{OutboundChannel, SpoutError};
use spout_rooms::RoomRegistry;
use spout_store::ChatStore;

use crate::handlers;
use crate::webhook;
use crate::ws;

/// Shared state for axum request handlers.
///
/// Every collaborator is constructed at startup and injected here; nothing
/// in the gateway reaches for process-wide singletons.
#[derive(Clone)]
pub struct GatewayState {
    /// Durable conversations + message log.
    pub store: Arc<ChatStore>,
    /// In-process room broadcaster.
    pub rooms: Arc<RoomRegistry>,
    /// Outbound channel to the messaging provider.
    pub outbound: Arc<dyn OutboundChannel>,
    /// Vendor this deployment serves; stamped on conversations created on
    /// first contact.
    pub vendor_id: String,
    /// Secret for the webhook subscription handshake. `None` rejects all
    /// verification attempts (fail-closed).
    pub webhook_verify_token: Option<String>,
}

/// Gateway server configuration (mirrors ServerConfig from spout-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router with all routes and middleware.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws/chat/{customer_id}", get(ws::ws_handler))
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        .route("/v1/conversations", get(handlers::list_conversations))
        .route(
            "/v1/conversations/assign",
            post(handlers::assign_conversation),
        )
        .route(
            "/v1/conversations/collaborators/add",
            post(handlers::add_collaborators),
        )
        .route(
            "/v1/conversations/collaborators/remove",
            post(handlers::remove_collaborators),
        )
        .route(
            "/v1/conversations/status",
            put(handlers::set_conversation_status),
        )
        .route("/v1/messages/send", post(handlers::send_to_customer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP/WebSocket server.
///
/// Runs until `shutdown` resolves, then stops accepting connections and
/// drains the ones in flight.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SpoutError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SpoutError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SpoutError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
