use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone};

use super::format::format_timestamp;
use super::grouping::group_by_day;
use super::message::{ConversationMessage, MessageSide};

/// Plain-text rendering of a thread, one day header per bucket.
pub fn render_transcript<Tz>(
    messages: &[ConversationMessage],
    current_user: &str,
    now: &DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if messages.is_empty() {
        return "(no messages)\n".to_string();
    }

    let tz = now.timezone();
    let mut out = String::new();

    for group in group_by_day(messages, now) {
        let _ = writeln!(out, "── {} ──", group.label);
        for message in group.messages {
            let time = message
                .created_at
                .as_ref()
                .map(|ts| format_timestamp(ts, &tz))
                .unwrap_or_else(|| "--".to_string());
            let who = match message.side(current_user) {
                MessageSide::Own => format!("{} (you)", message.sender),
                MessageSide::Other => message.sender.clone(),
            };
            let _ = writeln!(out, "[{time}] {who}: {}", message.content.summary());
        }
    }

    out
}
