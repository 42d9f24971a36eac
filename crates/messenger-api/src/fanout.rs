//! Send-message unit of work.
//!
//! A send is one message row plus one conversation index row per
//! participant. The store offers no atomicity across those rows, so every
//! write outcome is recorded and the caller decides how to surface a
//! partial result. Nothing is rolled back.

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use messenger_db::Database;
use messenger_db::models::{ConversationRow, MessageRow};
use messenger_types::api::{MessageRecord, SendMessageRequest};
use messenger_types::models::{ParticipantSet, now_millis, preview};

/// A send that has been resolved (id, timestamp, roster) but not written.
#[derive(Debug, Clone)]
pub struct SendUnit {
    message: MessageRecord,
    participants: ParticipantSet,
    preview: String,
}

/// Outcome of a single conversation index write.
#[derive(Debug)]
pub struct MembershipWrite {
    pub user_id: Uuid,
    pub result: anyhow::Result<()>,
}

/// What happened to every row of a send whose message row was stored.
#[derive(Debug)]
pub struct FanoutReport {
    pub message: MessageRecord,
    pub writes: Vec<MembershipWrite>,
}

impl SendUnit {
    pub fn new(req: SendMessageRequest) -> Self {
        Self::at(req, Uuid::new_v4(), now_millis())
    }

    fn at(req: SendMessageRequest, message_id: Uuid, message_timestamp: DateTime<Utc>) -> Self {
        let participants = ParticipantSet::for_send(req.sender_id, req.participant_ids.as_deref());
        let preview = preview(&req.message_text);

        Self {
            message: MessageRecord {
                message_id,
                conversation_id: req.conversation_id,
                sender_id: req.sender_id,
                message_text: req.message_text,
                message_timestamp,
            },
            participants,
            preview,
        }
    }

    pub fn message(&self) -> &MessageRecord {
        &self.message
    }

    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    /// Write the message row, then one index row per participant.
    ///
    /// Fails outright only if the message row cannot be written, in which
    /// case no index rows are attempted. Index write failures do not stop the
    /// remaining writes; they are collected in the report.
    pub fn execute(self, db: &Database) -> anyhow::Result<FanoutReport> {
        let message_timestamp = self.message.message_timestamp.timestamp_millis();
        let conversation_id = self.message.conversation_id.to_string();

        db.insert_message(&MessageRow {
            conversation_id: conversation_id.clone(),
            message_timestamp,
            message_id: self.message.message_id.to_string(),
            sender_id: self.message.sender_id.to_string(),
            message_text: self.message.message_text.clone(),
        })
        .with_context(|| format!("writing message {}", self.message.message_id))?;

        let participant_ids = serde_json::to_string(&self.participants)?;

        let writes = self
            .participants
            .iter()
            .map(|user_id| {
                let result = db.upsert_conversation(&ConversationRow {
                    user_id: user_id.to_string(),
                    last_activity: message_timestamp,
                    conversation_id: conversation_id.clone(),
                    participant_ids: Some(participant_ids.clone()),
                    last_message_preview: Some(self.preview.clone()),
                });
                if let Err(e) = &result {
                    warn!(
                        "Conversation index write failed for user {} (message {}): {}",
                        user_id, self.message.message_id, e
                    );
                }
                MembershipWrite { user_id: *user_id, result }
            })
            .collect();

        let report = FanoutReport {
            message: self.message,
            writes,
        };
        debug!(
            "Message {} fanned out to {}/{} participants",
            report.message.message_id,
            report.written(),
            report.writes.len()
        );
        Ok(report)
    }
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.writes.iter().all(|w| w.result.is_ok())
    }

    pub fn written(&self) -> usize {
        self.writes.iter().filter(|w| w.result.is_ok()).count()
    }

    pub fn failed_user_ids(&self) -> Vec<Uuid> {
        self.writes
            .iter()
            .filter(|w| w.result.is_err())
            .map(|w| w.user_id)
            .collect()
    }
}
