// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server assembly: construct every collaborator, wire the gateway state,
//! and run until shutdown.
//!
//! All components are built here and injected; the store is opened at
//! start and closed after the server drains.

use std::sync::Arc;

use tracing::info;

use spout_config::SpoutConfig;
use spout_core::{OutboundChannel, SpoutError};
use spout_gateway::{GatewayState, ServerConfig, start_server};
use spout_rooms::RoomRegistry;
use spout_store::ChatStore;
use spout_whatsapp::WhatsAppClient;

/// Run the chat gateway until ctrl-c.
pub async fn run(config: SpoutConfig) -> Result<(), SpoutError> {
    let store = Arc::new(ChatStore::open(&config.storage.database_path).await?);
    let rooms = Arc::new(RoomRegistry::new());
    let outbound: Arc<dyn OutboundChannel> =
        Arc::new(WhatsAppClient::from_config(&config.whatsapp)?);

    let state = GatewayState {
        store: Arc::clone(&store),
        rooms,
        outbound,
        vendor_id: config.vendor.id.clone(),
        webhook_verify_token: config.whatsapp.verify_token.clone(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    info!(vendor_id = %config.vendor.id, "starting spout");
    start_server(&server_config, state, shutdown_signal()).await?;

    // The router and its state are gone once the server drains; close the
    // store we still hold.
    if let Ok(store) = Arc::try_unwrap(store) {
        store.close().await?;
        info!("store closed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
