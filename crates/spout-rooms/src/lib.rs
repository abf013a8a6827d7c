// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process publish/subscribe registry mapping customer rooms to
//! connected realtime sessions.
//!
//! One room per customer, shared by every staff connection viewing that
//! customer's chat. The registry is sharded by dashmap, so subscribe,
//! unsubscribe, and publish on unrelated rooms never contend on one lock.

pub mod registry;

pub use registry::{RoomRegistry, RoomSubscription, room_key};
