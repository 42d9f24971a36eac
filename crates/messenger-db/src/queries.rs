use crate::Database;
use crate::models::{ConversationRow, MessageRow};
use anyhow::Result;
use rusqlite::{Connection, params};

const SELECT_MESSAGES: &str = "
    SELECT conversation_id, message_timestamp, message_id, sender_id, message_text
    FROM messages_by_conversation
    WHERE conversation_id = ?1
    ORDER BY message_timestamp DESC";

const SELECT_MESSAGES_BEFORE: &str = "
    SELECT conversation_id, message_timestamp, message_id, sender_id, message_text
    FROM messages_by_conversation
    WHERE conversation_id = ?1
      AND message_timestamp < ?2
    ORDER BY message_timestamp DESC";

impl Database {
    // -- Conversations --

    /// Upsert one activity row into a user's conversation index. A row with
    /// the same `(user_id, last_activity)` is replaced.
    pub fn upsert_conversation(&self, row: &ConversationRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO user_conversations
                    (user_id, last_activity, conversation_id, participant_ids, last_message_preview)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.user_id,
                    row.last_activity,
                    row.conversation_id,
                    row.participant_ids,
                    row.last_message_preview,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_conversations_for_user(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| query_conversations(conn, user_id))
    }

    // -- Messages --

    /// Upsert a message row keyed by `(conversation_id, message_timestamp)`.
    pub fn insert_message(&self, row: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO messages_by_conversation
                    (conversation_id, message_timestamp, message_id, sender_id, message_text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.conversation_id,
                    row.message_timestamp,
                    row.message_id,
                    row.sender_id,
                    row.message_text,
                ],
            )?;
            Ok(())
        })
    }

    /// Messages newest first. With `before`, only rows strictly older than
    /// the cursor (epoch millis) are returned.
    pub fn get_messages(&self, conversation_id: &str, before: Option<i64>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, conversation_id, before))
    }
}

fn query_conversations(conn: &Connection, user_id: &str) -> Result<Vec<ConversationRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, last_activity, conversation_id, participant_ids, last_message_preview
         FROM user_conversations
         WHERE user_id = ?1
         ORDER BY last_activity DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(ConversationRow {
                user_id: row.get(0)?,
                last_activity: row.get(1)?,
                conversation_id: row.get(2)?,
                participant_ids: row.get(3)?,
                last_message_preview: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_messages(conn: &Connection, conversation_id: &str, before: Option<i64>) -> Result<Vec<MessageRow>> {
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<MessageRow> {
        Ok(MessageRow {
            conversation_id: row.get(0)?,
            message_timestamp: row.get(1)?,
            message_id: row.get(2)?,
            sender_id: row.get(3)?,
            message_text: row.get(4)?,
        })
    };

    let rows = match before {
        Some(cursor) => {
            let mut stmt = conn.prepare(SELECT_MESSAGES_BEFORE)?;
            stmt.query_map(params![conversation_id, cursor], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(SELECT_MESSAGES)?;
            stmt.query_map([conversation_id], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}
