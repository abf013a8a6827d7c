// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business channel adapter.
//!
//! Two halves: [`client`] delivers outbound text messages through the Graph
//! API, and [`webhook`] normalizes the provider's nested webhook payloads
//! into canonical inbound events and implements the subscription handshake.

pub mod client;
pub mod webhook;

pub use client::WhatsAppClient;
pub use webhook::{ParseFailure, WebhookEnvelope, parse_inbound, verify_challenge};
