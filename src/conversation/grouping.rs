use chrono::{DateTime, TimeZone};

use super::format::humanize_day;
use super::message::ConversationMessage;

/// A run of consecutive messages sharing a day label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    pub label: String,
    pub messages: Vec<&'a ConversationMessage>,
}

/// Partition messages into day buckets, preserving arrival order.
///
/// Buckets are contiguous runs: a label that reappears after a different
/// one starts a new bucket, so concatenating the buckets always yields the
/// input order. Server-ordered snapshots never produce such repeats.
pub fn group_by_day<'a, Tz: TimeZone>(
    messages: &'a [ConversationMessage],
    now: &DateTime<Tz>,
) -> Vec<DayGroup<'a>> {
    let mut groups: Vec<DayGroup<'a>> = Vec::new();

    for message in messages {
        let label = humanize_day(message.created_at.as_ref(), now);
        match groups.last_mut() {
            Some(group) if group.label == label => group.messages.push(message),
            _ => groups.push(DayGroup {
                label,
                messages: vec![message],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::conversation::MessageContent;
    use crate::conversation::format::{TODAY, YESTERDAY};

    fn message_at(id: i64, created_at: DateTime<Utc>) -> ConversationMessage {
        ConversationMessage {
            id,
            sender: "alice".to_string(),
            receiver: "bob".to_string(),
            content: MessageContent::Text(format!("message {id}")),
            created_at: Some(created_at),
        }
    }

    #[test]
    fn groups_into_labelled_days_in_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let messages = vec![
            message_at(1, now - Duration::days(4)),
            message_at(2, now - Duration::days(4) + Duration::minutes(5)),
            message_at(3, now - Duration::hours(24)),
            message_at(4, now - Duration::hours(1)),
            message_at(5, now),
        ];

        let groups = group_by_day(&messages, &now);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["06 May 2024", YESTERDAY, TODAY]);

        let ids: Vec<Vec<i64>> = groups
            .iter()
            .map(|g| g.messages.iter().map(|m| m.id).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2], vec![3], vec![4, 5]]);
    }

    #[test]
    fn out_of_order_days_start_new_runs() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let messages = vec![
            message_at(1, now),
            message_at(2, now - Duration::hours(24)),
            message_at(3, now),
        ];

        let groups = group_by_day(&messages, &now);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, [TODAY, YESTERDAY, TODAY]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        let now = Utc::now();
        assert!(group_by_day(&[], &now).is_empty());
    }
}
