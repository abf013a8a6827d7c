// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room registry with isolated per-subscriber delivery.
//!
//! Every subscriber owns a bounded mpsc channel. `publish` snapshots the
//! room's sender set, drops the shard lock, then delivers with `try_send`:
//! a slow or broken subscriber loses events from its own queue but can
//! never block the publisher or another subscriber. Unsubscription is tied
//! to the subscription guard's `Drop`, so no disconnect path can skip it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use spout_core::types::MessageEvent;

/// Events buffered per subscriber before a laggard starts losing them.
const EVENT_BUFFER: usize = 64;

type RoomMap = DashMap<String, HashMap<u64, mpsc::Sender<MessageEvent>>>;

/// Derive the fan-out group key for a customer. Deterministic: every
/// publisher and subscriber for the same customer lands in the same room.
pub fn room_key(customer_id: &str) -> String {
    format!("chat_{customer_id}")
}

/// Shared registry of customer rooms and their subscribed sessions.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Arc<RoomMap>,
    next_subscriber_id: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the customer's room. The returned subscription receives every
    /// event published to the room until it is dropped.
    pub fn subscribe(&self, customer_id: &str) -> RoomSubscription {
        let key = room_key(customer_id);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        self.rooms.entry(key.clone()).or_default().insert(id, tx);
        debug!(room = %key, subscriber = id, "subscribed");

        RoomSubscription {
            rooms: Arc::clone(&self.rooms),
            key,
            id,
            rx,
        }
    }

    /// Deliver `event` to every session currently subscribed to the
    /// customer's room. Returns how many subscriber queues accepted it.
    pub fn publish(&self, customer_id: &str, event: &MessageEvent) -> usize {
        let key = room_key(customer_id);

        // Snapshot the sender set so the shard lock is released before any
        // delivery work.
        let senders: Vec<(u64, mpsc::Sender<MessageEvent>)> = match self.rooms.get(&key) {
            Some(room) => room.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for (id, tx) in senders {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(room = %key, subscriber = id, "subscriber queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(room = %key, subscriber = id, "subscriber gone, skipping");
                }
            }
        }
        delivered
    }

    /// Number of sessions currently subscribed to the customer's room.
    pub fn subscriber_count(&self, customer_id: &str) -> usize {
        self.rooms
            .get(&room_key(customer_id))
            .map(|room| room.len())
            .unwrap_or(0)
    }
}

/// Guard for one room membership.
///
/// Receives published events via [`recv`](Self::recv); dropping it removes
/// the session from the room (and the room itself once empty).
pub struct RoomSubscription {
    rooms: Arc<RoomMap>,
    key: String,
    id: u64,
    rx: mpsc::Receiver<MessageEvent>,
}

impl RoomSubscription {
    /// Next event published to the room, or `None` if the registry is gone.
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        self.rx.recv().await
    }

    pub fn room(&self) -> &str {
        &self.key
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        if let Some(mut room) = self.rooms.get_mut(&self.key) {
            room.remove(&self.id);
            if room.is_empty() {
                drop(room);
                self.rooms.remove_if(&self.key, |_, members| members.is_empty());
            }
        }
        debug!(room = %self.key, subscriber = self.id, "unsubscribed");
    }
}
