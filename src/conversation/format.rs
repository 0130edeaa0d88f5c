use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

pub const TODAY: &str = "Today";
pub const YESTERDAY: &str = "Yesterday";
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Day label for a timestamp relative to `now`, in `now`'s timezone.
pub fn humanize_day<Tz: TimeZone>(timestamp: Option<&DateTime<Utc>>, now: &DateTime<Tz>) -> String {
    let Some(timestamp) = timestamp else {
        return UNKNOWN_DATE.to_string();
    };

    let day = timestamp.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();

    if day == today {
        TODAY.to_string()
    } else if today.pred_opt() == Some(day) {
        YESTERDAY.to_string()
    } else {
        day.format("%d %B %Y").to_string()
    }
}

/// `DD Mon YYYY, HH:MM` in the given timezone.
pub fn format_timestamp<Tz>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(tz)
        .format("%d %b %Y, %H:%M")
        .to_string()
}

/// Up to two uppercase initials, one per space-separated word.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};

    use super::*;

    fn sofia_noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 10, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn labels_today_yesterday_and_older_days() {
        let now = sofia_noon();
        let now_utc = now.with_timezone(&Utc);

        assert_eq!(humanize_day(Some(&now_utc), &now), TODAY);
        assert_eq!(
            humanize_day(Some(&(now_utc - Duration::hours(24))), &now),
            YESTERDAY
        );
        assert_eq!(
            humanize_day(Some(&(now_utc - Duration::days(3))), &now),
            "07 May 2024"
        );
        assert_eq!(humanize_day(None, &now), UNKNOWN_DATE);
    }

    #[test]
    fn day_boundaries_follow_the_local_timezone() {
        let now = sofia_noon();
        // 23:30 UTC on the 9th is 02:30 on the 10th at +03:00.
        let late_utc = Utc.with_ymd_and_hms(2024, 5, 9, 23, 30, 0).unwrap();
        assert_eq!(humanize_day(Some(&late_utc), &now), TODAY);
    }

    #[test]
    fn formats_timestamps_in_the_target_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 21, 5, 0).unwrap();
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(format_timestamp(&ts, &plus_three), "02 May 2024, 00:05");
        assert_eq!(format_timestamp(&ts, &Utc), "01 May 2024, 21:05");
    }

    #[test]
    fn initials_take_first_letters_of_two_words() {
        assert_eq!(initials("alice"), "A");
        assert_eq!(initials("mary jane watson"), "MJ");
        assert_eq!(initials("  bob"), "B");
        assert_eq!(initials(""), "");
    }
}
