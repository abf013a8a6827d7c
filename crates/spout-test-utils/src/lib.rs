// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Spout integration tests.

pub mod harness;
pub mod mock_outbound;

pub use harness::TestHarness;
pub use mock_outbound::MockOutbound;
