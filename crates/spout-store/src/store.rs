// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level store handle bundling the database and the message clock.
//!
//! One `ChatStore` is constructed at startup and injected into the gateway
//! state; there is no process-wide singleton. `close()` is the explicit end
//! of its lifecycle.

use spout_core::SpoutError;
use spout_core::types::{ChatMessage, Conversation};

use crate::clock::{self, MessageClock};
use crate::database::Database;
use crate::queries;

/// Injected store client for conversations and the message log.
pub struct ChatStore {
    db: Database,
    clock: MessageClock,
}

impl ChatStore {
    /// Open the backing database and wrap it with a fresh message clock.
    pub async fn open(path: &str) -> Result<Self, SpoutError> {
        let db = Database::open(path).await?;
        Ok(Self {
            db,
            clock: MessageClock::new(),
        })
    }

    /// Build a store around an already-open database (tests).
    pub fn from_database(db: Database) -> Self {
        Self {
            db,
            clock: MessageClock::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Flush and close the backing database.
    pub async fn close(self) -> Result<(), SpoutError> {
        self.db.close().await
    }

    /// Resolve the canonical conversation for a customer, creating it on
    /// first contact. See [`queries::conversations::resolve_or_create`].
    pub async fn resolve_or_create(
        &self,
        customer_id: &str,
        vendor_id: &str,
    ) -> Result<String, SpoutError> {
        queries::conversations::resolve_or_create(&self.db, customer_id, vendor_id).await
    }

    /// Append one message to the customer's log with a timestamp strictly
    /// greater than every message already stored or issued for them, and
    /// persist it before returning.
    pub async fn append(
        &self,
        customer_id: &str,
        conversation_id: &str,
        sender_id: Option<String>,
        body: &str,
    ) -> Result<ChatMessage, SpoutError> {
        // First append for this customer in this process: raise the clock
        // floor to the stored maximum so a backwards wall clock cannot
        // collide with persisted rows.
        if !self.clock.is_seeded(customer_id) {
            if let Some(last) = queries::messages::last_timestamp(&self.db, customer_id).await?
                && let Some(micros) = clock::parse_stamp(&last)
            {
                self.clock.observe(customer_id, micros);
            }
        }

        let msg = ChatMessage {
            customer_id: customer_id.to_string(),
            timestamp: self.clock.next_stamp(customer_id),
            conversation_id: conversation_id.to_string(),
            sender_id,
            message: body.to_string(),
        };
        queries::messages::insert_message(&self.db, &msg).await?;
        Ok(msg)
    }

    /// All messages for a customer, oldest first.
    pub async fn history(&self, customer_id: &str) -> Result<Vec<ChatMessage>, SpoutError> {
        queries::messages::history(&self.db, customer_id).await
    }

    pub async fn get(&self, conversation_id: &str) -> Result<Option<Conversation>, SpoutError> {
        queries::conversations::get_conversation(&self.db, conversation_id).await
    }

    pub async fn assign(
        &self,
        conversation_id: &str,
        user_id: Option<String>,
        team_id: Option<String>,
    ) -> Result<(), SpoutError> {
        queries::conversations::assign(&self.db, conversation_id, user_id, team_id).await
    }

    pub async fn add_collaborators(
        &self,
        conversation_id: &str,
        user_ids: Vec<String>,
    ) -> Result<Vec<String>, SpoutError> {
        queries::conversations::add_collaborators(&self.db, conversation_id, user_ids).await
    }

    pub async fn remove_collaborators(
        &self,
        conversation_id: &str,
        user_ids: Vec<String>,
    ) -> Result<Vec<String>, SpoutError> {
        queries::conversations::remove_collaborators(&self.db, conversation_id, user_ids).await
    }

    pub async fn set_open_status(
        &self,
        conversation_ids: Vec<String>,
        is_open: bool,
    ) -> Result<usize, SpoutError> {
        queries::conversations::set_open_status(&self.db, conversation_ids, is_open).await
    }

    pub async fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Conversation>, SpoutError> {
        queries::conversations::list_by_vendor(&self.db, vendor_id).await
    }
}
