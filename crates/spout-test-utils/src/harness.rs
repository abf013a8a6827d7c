// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete chat stack: a temp SQLite store,
//! the room registry, a mock outbound channel, and the gateway router
//! served on an ephemeral local port. Tests drive it over real HTTP and
//! WebSocket connections.

use std::net::SocketAddr;
use std::sync::Arc;

use spout_core::SpoutError;
use spout_gateway::{GatewayState, build_router};
use spout_rooms::RoomRegistry;
use spout_store::ChatStore;

use crate::mock_outbound::MockOutbound;

/// Verification secret the harness configures for the webhook handshake.
pub const TEST_VERIFY_TOKEN: &str = "hook-secret";

/// Vendor id the harness stamps onto conversations.
pub const TEST_VENDOR_ID: &str = "vendor-test";

/// A complete test environment serving the gateway on an ephemeral port.
pub struct TestHarness {
    /// Durable store (temp SQLite, dropped with the harness).
    pub store: Arc<ChatStore>,
    /// Room broadcaster.
    pub rooms: Arc<RoomRegistry>,
    /// The captured-send mock provider.
    pub outbound: Arc<MockOutbound>,
    /// Address the gateway is listening on.
    pub addr: SocketAddr,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Build the stack and start serving it.
    pub async fn start() -> Result<Self, SpoutError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| SpoutError::Internal(format!("temp dir: {e}")))?;
        let db_path = temp_dir.path().join("test.db");
        let store = Arc::new(ChatStore::open(&db_path.to_string_lossy()).await?);

        let rooms = Arc::new(RoomRegistry::new());
        let outbound = Arc::new(MockOutbound::new());

        let state = GatewayState {
            store: Arc::clone(&store),
            rooms: Arc::clone(&rooms),
            outbound: Arc::clone(&outbound) as Arc<dyn spout_core::OutboundChannel>,
            vendor_id: TEST_VENDOR_ID.to_string(),
            webhook_verify_token: Some(TEST_VERIFY_TOKEN.to_string()),
        };

        let router = build_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| SpoutError::Internal(format!("bind test gateway: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| SpoutError::Internal(format!("local addr: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "test gateway stopped");
            }
        });

        Ok(Self {
            store,
            rooms,
            outbound,
            addr,
            _temp_dir: temp_dir,
        })
    }

    /// HTTP URL for a gateway path, e.g. `harness.http_url("/health")`.
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// WebSocket URL for a customer's realtime session.
    pub fn ws_url(&self, customer_id: &str) -> String {
        format!("ws://{}/ws/chat/{customer_id}", self.addr)
    }
}
