// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Spout chat core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed
//! operations for conversations and the per-customer message log.
//!
//! Multi-step operations (lookup-or-insert, read-modify-write of the
//! collaborator list) run inside a single `call` closure on the writer
//! thread, which serializes them against every other store operation.

pub mod clock;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use clock::MessageClock;
pub use database::Database;
pub use models::*;
pub use store::ChatStore;
