use anyhow::{Context, anyhow};
use axum::{Json, extract::{Path, State}};
use axum_extra::extract::WithRejection;
use chrono::DateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use messenger_db::models::ConversationRow;
use messenger_types::api::ConversationSnapshot;
use messenger_types::models::ParticipantSet;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// Conversations a user has been active in, most recent first. Each entry is
/// an activity snapshot, so one conversation can appear more than once.
pub async fn list_for_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Vec<ConversationSnapshot>>, ApiError> {
    let uid = user_id.to_string();
    let rows = blocking(&state, move |db| Ok(db.get_conversations_for_user(&uid)?)).await?;

    debug!("User {} has {} conversation snapshots", user_id, rows.len());

    let snapshots = rows
        .into_iter()
        .map(snapshot_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(snapshots))
}

fn snapshot_from_row(row: ConversationRow) -> anyhow::Result<ConversationSnapshot> {
    let participant_ids = match row.participant_ids.as_deref() {
        Some(raw) => serde_json::from_str::<ParticipantSet>(raw).unwrap_or_else(|e| {
            warn!("Corrupt participant_ids on user {} at {}: {}", row.user_id, row.last_activity, e);
            ParticipantSet::default()
        }),
        None => ParticipantSet::default(),
    };

    Ok(ConversationSnapshot {
        user_id: row.user_id.parse().with_context(|| format!("corrupt user_id '{}'", row.user_id))?,
        last_activity: DateTime::from_timestamp_millis(row.last_activity)
            .ok_or_else(|| anyhow!("last_activity out of range: {}", row.last_activity))?,
        conversation_id: row
            .conversation_id
            .parse()
            .with_context(|| format!("corrupt conversation_id '{}'", row.conversation_id))?,
        participant_ids: participant_ids.into(),
        last_message_preview: row.last_message_preview.unwrap_or_default(),
    })
}
