use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters kept in a conversation's `last_message_preview`.
pub const PREVIEW_CHARS: usize = 100;

/// The set of users taking part in a conversation event.
///
/// Stored as a set (duplicates collapse) and converted to an ordered
/// sequence at the HTTP boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantSet(BTreeSet<Uuid>);

impl ParticipantSet {
    /// Resolve the roster for a send. A missing or empty list means the
    /// sender alone; earlier rosters are not consulted.
    pub fn for_send(sender_id: Uuid, participant_ids: Option<&[Uuid]>) -> Self {
        match participant_ids {
            Some(ids) if !ids.is_empty() => ids.iter().copied().collect(),
            _ => Self::from_iter([sender_id]),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<Uuid> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<Uuid> for ParticipantSet {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<ParticipantSet> for Vec<Uuid> {
    fn from(set: ParticipantSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// First [`PREVIEW_CHARS`] characters of a message body.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Current time at the store's timestamp granularity (milliseconds).
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a pagination cursor.
///
/// Accepts RFC 3339 with any offset, or a naive ISO-8601 date-time which is
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.and_utc())
}
