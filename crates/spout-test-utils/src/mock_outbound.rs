// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound channel for deterministic testing.
//!
//! `MockOutbound` implements `OutboundChannel`, capturing every send for
//! assertion and returning a configurable outcome. Because the gateway
//! fires sends off the realtime path, tests wait for them with
//! [`wait_for_sends`](MockOutbound::wait_for_sends).

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use spout_core::traits::OutboundChannel;
use spout_core::types::DeliveryOutcome;

/// One captured outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
}

/// A mock messaging provider for testing.
pub struct MockOutbound {
    sent: Mutex<Vec<SentMessage>>,
    outcome: Mutex<DeliveryOutcome>,
    notify: Notify,
}

impl MockOutbound {
    /// Create a mock that reports every send as delivered.
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            outcome: Mutex::new(DeliveryOutcome::Delivered { message_id: None }),
            notify: Notify::new(),
        }
    }

    /// Set the outcome returned for subsequent sends.
    pub async fn set_outcome(&self, outcome: DeliveryOutcome) {
        *self.outcome.lock().await = outcome;
    }

    /// All sends captured so far.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Number of sends captured so far.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Wait until at least `count` sends have been captured.
    ///
    /// Panics after `timeout` -- tests should fail loudly rather than hang.
    pub async fn wait_for_sends(&self, count: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.sent.lock().await.len() >= count {
                return;
            }
            let notified = self.notify.notified();
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let actual = self.sent.lock().await.len();
                panic!("expected {count} outbound sends within {timeout:?}, saw {actual}");
            }
        }
    }
}

impl Default for MockOutbound {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboundChannel for MockOutbound {
    fn name(&self) -> &str {
        "mock-outbound"
    }

    async fn send_text(&self, customer_id: &str, body: &str) -> DeliveryOutcome {
        self.sent.lock().await.push(SentMessage {
            to: customer_id.to_string(),
            body: body.to_string(),
        });
        self.notify.notify_waiters();
        self.outcome.lock().await.clone()
    }
}
