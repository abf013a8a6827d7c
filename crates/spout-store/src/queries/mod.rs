// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query operations over the conversations and messages tables.

pub mod conversations;
pub mod messages;
