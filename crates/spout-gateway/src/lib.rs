// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Spout chat core.
//!
//! Routes:
//! - `GET /ws/chat/{customer_id}` -- staff realtime session
//! - `GET|POST /webhook` -- WhatsApp subscription handshake + inbound events
//! - `GET /health`
//! - `/v1/conversations*` -- conversation administration
//! - `POST /v1/messages/send` -- direct outbound delivery

pub mod handlers;
pub mod server;
pub mod webhook;
pub mod ws;

pub use server::{GatewayState, ServerConfig, build_router, start_server};
