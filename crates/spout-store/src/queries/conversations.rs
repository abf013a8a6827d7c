// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store operations.
//!
//! Each operation runs inside one `call` closure on the writer thread, so
//! lookup-or-insert and read-modify-write sequences cannot interleave with
//! concurrent callers. `colab_users` is stored as a JSON array with set
//! semantics: adds dedup, removes filter, insertion order is preserved.

use rusqlite::{OptionalExtension, params};
use spout_core::SpoutError;
use spout_core::types::Conversation;

use crate::database::{Database, map_tr_err};

const CONVERSATION_COLUMNS: &str = "conversation_id, vendor_id, customer_id, started_at, \
     updated_at, assigned_user_id, assigned_team_id, colab_users, is_open";

fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let colab_raw: String = row.get(7)?;
    Ok(Conversation {
        conversation_id: row.get(0)?,
        vendor_id: row.get(1)?,
        customer_id: row.get(2)?,
        started_at: row.get(3)?,
        updated_at: row.get(4)?,
        assigned_user_id: row.get(5)?,
        assigned_team_id: row.get(6)?,
        // A row predating the JSON encoding deserializes to an empty list
        // rather than poisoning every read of the conversation.
        colab_users: serde_json::from_str(&colab_raw).unwrap_or_default(),
        is_open: row.get::<_, i64>(8)? != 0,
    })
}

/// Resolve the canonical conversation for `customer_id`, creating it on
/// first contact.
///
/// On a hit, `updated_at` is touched. On a miss, a fresh record is inserted
/// with `is_open = true`, no assignment, and an empty collaborator list.
/// The `UNIQUE(customer_id)` constraint plus the single serialized closure
/// make concurrent first contacts converge on one record: both callers get
/// the same id back.
pub async fn resolve_or_create(
    db: &Database,
    customer_id: &str,
    vendor_id: &str,
) -> Result<String, SpoutError> {
    let customer = customer_id.to_string();
    let vendor = vendor_id.to_string();
    let candidate_id = uuid::Uuid::new_v4().to_string();
    let now = now_iso();

    db.connection()
        .call(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT conversation_id FROM conversations
                     WHERE customer_id = ?1 ORDER BY started_at LIMIT 1",
                    params![customer],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                conn.execute(
                    "UPDATE conversations SET updated_at = ?1 WHERE conversation_id = ?2",
                    params![now, id],
                )?;
                return Ok(id);
            }

            conn.execute(
                "INSERT INTO conversations
                     (conversation_id, vendor_id, customer_id, started_at, updated_at,
                      assigned_user_id, assigned_team_id, colab_users, is_open)
                 VALUES (?1, ?2, ?3, ?4, ?4, NULL, NULL, '[]', 1)
                 ON CONFLICT(customer_id) DO NOTHING",
                params![candidate_id, vendor, customer, now],
            )?;

            // Read back the winner in case the UNIQUE guard dropped our insert.
            let id: String = conn.query_row(
                "SELECT conversation_id FROM conversations
                 WHERE customer_id = ?1 ORDER BY started_at LIMIT 1",
                params![customer],
                |row| row.get(0),
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a conversation by id.
pub async fn get_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<Option<Conversation>, SpoutError> {
    let id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE conversation_id = ?1"
                ),
                params![id],
                conversation_from_row,
            )
            .optional()
            .map_err(Into::into)
        })
        .await
        .map_err(map_tr_err)
}

/// Set the assigned user and/or team on a conversation.
///
/// Whichever of the two is `None` is left untouched. At least one must be
/// provided; referencing a nonexistent conversation fails with
/// `ConversationNotFound`.
pub async fn assign(
    db: &Database,
    conversation_id: &str,
    user_id: Option<String>,
    team_id: Option<String>,
) -> Result<(), SpoutError> {
    if user_id.is_none() && team_id.is_none() {
        return Err(SpoutError::Validation(
            "at least one of assigned_user_id or assigned_team_id must be provided".to_string(),
        ));
    }

    let id = conversation_id.to_string();
    let id_in_closure = id.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            let updated = match (&user_id, &team_id) {
                (Some(user), Some(team)) => conn.execute(
                    "UPDATE conversations
                     SET assigned_user_id = ?1, assigned_team_id = ?2
                     WHERE conversation_id = ?3",
                    params![user, team, id_in_closure],
                )?,
                (Some(user), None) => conn.execute(
                    "UPDATE conversations SET assigned_user_id = ?1 WHERE conversation_id = ?2",
                    params![user, id_in_closure],
                )?,
                (None, Some(team)) => conn.execute(
                    "UPDATE conversations SET assigned_team_id = ?1 WHERE conversation_id = ?2",
                    params![team, id_in_closure],
                )?,
                (None, None) => 0,
            };
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(SpoutError::ConversationNotFound { id });
    }
    Ok(())
}

/// Append collaborators to a conversation, deduplicating against the
/// current list. An empty `user_ids` is a no-op that still verifies the
/// conversation exists. Returns the resulting list.
pub async fn add_collaborators(
    db: &Database,
    conversation_id: &str,
    user_ids: Vec<String>,
) -> Result<Vec<String>, SpoutError> {
    mutate_collaborators(db, conversation_id, move |list| {
        for user in &user_ids {
            if !list.contains(user) {
                list.push(user.clone());
            }
        }
    })
    .await
}

/// Remove collaborators from a conversation. Unknown ids are ignored and
/// an empty `user_ids` is a no-op. Returns the resulting list.
pub async fn remove_collaborators(
    db: &Database,
    conversation_id: &str,
    user_ids: Vec<String>,
) -> Result<Vec<String>, SpoutError> {
    mutate_collaborators(db, conversation_id, move |list| {
        list.retain(|user| !user_ids.contains(user));
    })
    .await
}

/// Shared read-modify-write cycle for the collaborator list, executed as
/// one serialized closure so concurrent edits cannot clobber each other.
async fn mutate_collaborators(
    db: &Database,
    conversation_id: &str,
    mutate: impl FnOnce(&mut Vec<String>) + Send + 'static,
) -> Result<Vec<String>, SpoutError> {
    let id = conversation_id.to_string();
    let id_in_closure = id.clone();

    db.connection()
        .call(move |conn| -> Result<Option<Vec<String>>, rusqlite::Error> {
            let current: Option<String> = conn
                .query_row(
                    "SELECT colab_users FROM conversations WHERE conversation_id = ?1",
                    params![id_in_closure],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(raw) = current else {
                return Ok(None);
            };

            let mut list: Vec<String> = serde_json::from_str(&raw).unwrap_or_default();
            let before = list.clone();
            mutate(&mut list);

            if list != before {
                let encoded = serde_json::to_string(&list)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                conn.execute(
                    "UPDATE conversations SET colab_users = ?1 WHERE conversation_id = ?2",
                    params![encoded, id_in_closure],
                )?;
            }
            Ok(Some(list))
        })
        .await
        .map_err(map_tr_err)?
        .ok_or(SpoutError::ConversationNotFound { id })
}

/// Bulk-set the open flag. Missing ids are skipped; ids that exist still
/// update. Returns the number of rows changed.
pub async fn set_open_status(
    db: &Database,
    conversation_ids: Vec<String>,
    is_open: bool,
) -> Result<usize, SpoutError> {
    db.connection()
        .call(move |conn| {
            let mut updated = 0;
            for id in &conversation_ids {
                updated += conn.execute(
                    "UPDATE conversations SET is_open = ?1 WHERE conversation_id = ?2",
                    params![is_open, id],
                )?;
            }
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)
}

/// List all conversations belonging to a vendor, most recently active first.
pub async fn list_by_vendor(
    db: &Database,
    vendor_id: &str,
) -> Result<Vec<Conversation>, SpoutError> {
    let vendor = vendor_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE vendor_id = ?1 ORDER BY updated_at DESC"
            ))?;
            let rows = stmt.query_map(params![vendor], conversation_from_row)?;
            let mut conversations = Vec::new();
            for row in rows {
                conversations.push(row?);
            }
            Ok(conversations)
        })
        .await
        .map_err(map_tr_err)
}

pub(crate) fn now_iso() -> String {
    crate::clock::format_stamp(chrono::Utc::now().timestamp_micros())
}
