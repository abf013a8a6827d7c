// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Spout chat backend.

use thiserror::Error;

/// The primary error type used across the Spout workspace.
#[derive(Debug, Error)]
pub enum SpoutError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store unreachable or a query failed. Fatal to the triggering
    /// request, retryable by the client.
    #[error("store unavailable: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An operation referenced a conversation that does not exist.
    #[error("conversation not found: {id}")]
    ConversationNotFound { id: String },

    /// Malformed inbound payload (empty body, unparsable JSON, missing fields).
    #[error("validation error: {0}")]
    Validation(String),

    /// Outbound provider call failed. Logged and surfaced as a non-fatal
    /// delivery status; never rolls back already-persisted state.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
