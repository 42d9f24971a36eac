//! Database row types, mapping directly to store rows.
//! Identifiers stay as text and timestamps as epoch milliseconds; the API
//! layer owns conversion into wire types.

pub struct ConversationRow {
    pub user_id: String,
    pub last_activity: i64,
    pub conversation_id: String,
    /// JSON array, `None` when the row was written without a set.
    pub participant_ids: Option<String>,
    pub last_message_preview: Option<String>,
}

pub struct MessageRow {
    pub conversation_id: String,
    pub message_timestamp: i64,
    pub message_id: String,
    pub sender_id: String,
    pub message_text: String,
}
