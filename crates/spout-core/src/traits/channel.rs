// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound channel seam for the external messaging provider.

use async_trait::async_trait;

use crate::types::DeliveryOutcome;

/// Outbound delivery to the customer-facing messaging provider.
///
/// The gateway depends on this seam rather than the concrete WhatsApp
/// client so tests can capture sends. There is exactly one production
/// implementation; this is not a multi-provider registry.
#[async_trait]
pub trait OutboundChannel: Send + Sync + 'static {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Deliver a text message to the customer identified by `customer_id`.
    ///
    /// Never fails the caller: rejections and transport faults come back as
    /// [`DeliveryOutcome`] variants. Implementations must bound the call
    /// with a timeout so the realtime path is never blocked indefinitely.
    async fn send_text(&self, customer_id: &str, body: &str) -> DeliveryOutcome;
}
