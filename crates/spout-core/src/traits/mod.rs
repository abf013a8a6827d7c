// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the chat core and its collaborators.

pub mod channel;

pub use channel::OutboundChannel;
