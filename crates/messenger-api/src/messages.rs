use anyhow::{Context, anyhow};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::DateTime;
use tracing::{debug, info};
use uuid::Uuid;

use messenger_db::models::MessageRow;
use messenger_types::api::{BeforeQuery, MessageRecord, SendMessageRequest};
use messenger_types::models::parse_timestamp;

use crate::error::ApiError;
use crate::fanout::SendUnit;
use crate::state::{AppState, blocking};

/// Store a message and fan it out to every participant's conversation index.
///
/// Callers that want more than the sender to see the conversation must send
/// the full roster on every call; an omitted roster is the sender alone.
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = SendUnit::new(req);
    let participants = unit.participants().len();

    let report = blocking(&state, move |db| Ok(unit.execute(db)?)).await?;

    if !report.is_complete() {
        let failed_user_ids = report.failed_user_ids();
        return Err(ApiError::PartialFanout {
            message: report.message,
            failed_user_ids,
        });
    }

    info!(
        "Message {} sent to conversation {} ({} participants)",
        report.message.message_id, report.message.conversation_id, participants
    );

    Ok((StatusCode::CREATED, Json(report.message)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    load_messages(&state, conversation_id, None).await.map(Json)
}

/// Messages strictly older than `?timestamp=`, for loading history a page at
/// a time.
pub async fn list_messages_before(
    State(state): State<AppState>,
    WithRejection(Path(conversation_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<BeforeQuery>, ApiError>,
) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    let raw = query
        .timestamp
        .ok_or_else(|| ApiError::Validation("missing query parameter 'timestamp'".into()))?;
    let cursor = parse_timestamp(&raw)
        .ok_or_else(|| ApiError::Validation(format!("invalid timestamp '{}'", raw)))?;

    load_messages(&state, conversation_id, Some(cursor.timestamp_millis()))
        .await
        .map(Json)
}

async fn load_messages(
    state: &AppState,
    conversation_id: Uuid,
    before: Option<i64>,
) -> Result<Vec<MessageRecord>, ApiError> {
    let cid = conversation_id.to_string();
    let rows = blocking(state, move |db| Ok(db.get_messages(&cid, before)?)).await?;

    debug!(
        "Loaded {} messages for conversation {} (before: {:?})",
        rows.len(),
        conversation_id,
        before
    );

    let messages = rows
        .into_iter()
        .map(record_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(messages)
}

fn record_from_row(row: MessageRow) -> anyhow::Result<MessageRecord> {
    Ok(MessageRecord {
        message_id: row
            .message_id
            .parse()
            .with_context(|| format!("corrupt message_id '{}'", row.message_id))?,
        conversation_id: row
            .conversation_id
            .parse()
            .with_context(|| format!("corrupt conversation_id '{}'", row.conversation_id))?,
        sender_id: row
            .sender_id
            .parse()
            .with_context(|| format!("corrupt sender_id '{}' on message '{}'", row.sender_id, row.message_id))?,
        message_timestamp: DateTime::from_timestamp_millis(row.message_timestamp)
            .ok_or_else(|| anyhow!("message_timestamp out of range: {}", row.message_timestamp))?,
        message_text: row.message_text,
    })
}
