// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.
//!
//! The log is append-only and keyed by `(customer_id, timestamp)`. Inserts
//! use `ON CONFLICT DO NOTHING` so retrying a write whose acknowledgement
//! was lost cannot double-deliver a message.

use rusqlite::{OptionalExtension, params};
use spout_core::SpoutError;
use spout_core::types::ChatMessage;

use crate::database::{Database, map_tr_err};

/// Persist one message. Idempotent on the composite primary key.
pub async fn insert_message(db: &Database, msg: &ChatMessage) -> Result<(), SpoutError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (customer_id, timestamp, conversation_id, sender_id, message)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(customer_id, timestamp) DO NOTHING",
                params![
                    msg.customer_id,
                    msg.timestamp,
                    msg.conversation_id,
                    msg.sender_id,
                    msg.message,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All messages for a customer in ascending timestamp order.
pub async fn history(db: &Database, customer_id: &str) -> Result<Vec<ChatMessage>, SpoutError> {
    let customer = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT customer_id, timestamp, conversation_id, sender_id, message
                 FROM messages WHERE customer_id = ?1
                 ORDER BY timestamp ASC",
            )?;
            let rows = stmt.query_map(params![customer], |row| {
                Ok(ChatMessage {
                    customer_id: row.get(0)?,
                    timestamp: row.get(1)?,
                    conversation_id: row.get(2)?,
                    sender_id: row.get(3)?,
                    message: row.get(4)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Highest stored timestamp for a customer, if any. Used to seed the
/// message clock after a restart.
pub async fn last_timestamp(
    db: &Database,
    customer_id: &str,
) -> Result<Option<String>, SpoutError> {
    let customer = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT MAX(timestamp) FROM messages WHERE customer_id = ?1",
                params![customer],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map(Option::flatten)
            .map_err(Into::into)
        })
        .await
        .map_err(map_tr_err)
}
