// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical types shared across the Spout workspace.
//!
//! Timestamps are ISO-8601 strings with microsecond resolution. Within one
//! `customer_id` they double as the message sort key, so the store clamps
//! them to be strictly increasing per customer.

use serde::{Deserialize, Serialize};

/// A support conversation between one customer and the vendor's staff.
///
/// Created lazily on first contact (socket connect or first inbound webhook
/// message) and never deleted; closure flips `is_open` to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub vendor_id: String,
    /// External channel identity of the customer (the WhatsApp phone number).
    pub customer_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub assigned_user_id: Option<String>,
    pub assigned_team_id: Option<String>,
    /// Collaborating staff user ids. Set semantics with stable insertion order.
    pub colab_users: Vec<String>,
    pub is_open: bool,
}

/// One persisted chat message.
///
/// Identity is the composite of `customer_id` (partition) and `timestamp`
/// (ordering key). Messages are immutable and append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub customer_id: String,
    pub timestamp: String,
    pub conversation_id: String,
    /// Which participant authored the message. `None` for frames that did
    /// not carry a sender.
    pub sender_id: Option<String>,
    pub message: String,
}

/// The normalized representation of a message pushed to a customer's room,
/// regardless of whether it originated from a socket client or the channel
/// provider. Serializes to the realtime wire frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub timestamp: String,
}

impl MessageEvent {
    /// Build the broadcast event for a just-persisted message.
    pub fn from_message(msg: &ChatMessage) -> Self {
        Self {
            message: msg.message.clone(),
            sender_id: msg.sender_id.clone(),
            timestamp: msg.timestamp.clone(),
        }
    }
}

/// An inbound provider webhook event, normalized down to the two fields the
/// chat core acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub customer_id: String,
    pub body: String,
}

/// Result of one outbound delivery attempt to the channel provider.
///
/// Delivery failures are data, not errors: the caller logs the outcome and
/// moves on. Persisted inbound state is never rolled back on a failed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The provider accepted the message.
    Delivered { message_id: Option<String> },
    /// The provider refused the message (bad recipient, policy, quota).
    Rejected { reason: String },
    /// The provider could not be reached or the call timed out.
    Transport { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}
