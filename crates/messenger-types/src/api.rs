use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Conversations --

/// One activity snapshot from a user's conversation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub user_id: Uuid,
    pub last_activity: DateTime<Utc>,
    pub conversation_id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub last_message_preview: String,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub message_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub message_text: String,
    pub message_timestamp: DateTime<Utc>,
}

/// Query string for `/api/messages/conversation/{id}/before`.
#[derive(Debug, Deserialize)]
pub struct BeforeQuery {
    pub timestamp: Option<String>,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Body returned when the message row was stored but some participants'
/// conversation index rows were not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialFanoutBody {
    pub error: String,
    pub code: String,
    pub message: MessageRecord,
    pub failed_user_ids: Vec<Uuid>,
}
