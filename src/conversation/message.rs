use chrono::{DateTime, NaiveDateTime, Utc};

use crate::common::WireMessage;

use super::content::MessageContent;

/// A message after ingestion: content classified, timestamp parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: MessageContent,
    /// `None` when the backend sent a timestamp we could not parse.
    pub created_at: Option<DateTime<Utc>>,
}

/// Which side of the thread a message renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSide {
    /// Sent by the signed-in user; drawn on the right.
    Own,
    /// Sent by the counterpart; drawn on the left.
    Other,
}

impl ConversationMessage {
    pub fn side(&self, current_user: &str) -> MessageSide {
        if same_user(&self.sender, current_user) {
            MessageSide::Own
        } else {
            MessageSide::Other
        }
    }
}

impl From<WireMessage> for ConversationMessage {
    fn from(wire: WireMessage) -> Self {
        let created_at = parse_timestamp(&wire.created_at);
        if created_at.is_none() {
            log::warn!(
                "Message {} has unparseable timestamp `{}`",
                wire.id,
                wire.created_at
            );
        }

        Self {
            id: wire.id,
            sender: wire.sender_username,
            receiver: wire.receiver_username,
            content: MessageContent::from_raw(wire.content),
            created_at,
        }
    }
}

/// Convert a server snapshot, keeping server order.
pub fn ingest(wire: Vec<WireMessage>) -> Vec<ConversationMessage> {
    wire.into_iter().map(ConversationMessage::from).collect()
}

/// Parse an ISO timestamp. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn same_user(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
