// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Spout chat backend.
//!
//! This crate provides the error taxonomy, the canonical message and
//! conversation types shared across the workspace, and the outbound
//! channel trait the gateway delivers through.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SpoutError;
pub use traits::OutboundChannel;
pub use types::{ChatMessage, Conversation, DeliveryOutcome, InboundEvent, MessageEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spout_error_has_all_variants() {
        // Verify all 7 error variants exist and can be constructed.
        let _config = SpoutError::Config("test".into());
        let _store = SpoutError::Store {
            source: Box::new(std::io::Error::other("test")),
        };
        let _not_found = SpoutError::ConversationNotFound { id: "c-1".into() };
        let _validation = SpoutError::Validation("test".into());
        let _transport = SpoutError::Transport {
            message: "test".into(),
            source: None,
        };
        let _timeout = SpoutError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _internal = SpoutError::Internal("test".into());
    }

    #[test]
    fn store_error_displays_as_unavailable() {
        let err = SpoutError::Store {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(err.to_string().contains("store unavailable"));
    }

    #[test]
    fn conversation_not_found_names_the_id() {
        let err = SpoutError::ConversationNotFound { id: "c-42".into() };
        assert!(err.to_string().contains("c-42"));
    }
}
