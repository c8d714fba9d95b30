//! Utility functions and helpers

/// String utilities
pub mod string {
    /// `"1 user"`, `"3 users"`
    pub fn count_noun(count: usize, singular: &str, plural: &str) -> String {
        if count == 1 {
            format!("{} {}", count, singular)
        } else {
            format!("{} {}", count, plural)
        }
    }

    /// Drop characters that would break line framing on the way out
    pub fn escape_message(content: &str) -> String {
        content
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
            .collect()
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Utc};

    /// Human-readable timestamp, e.g. `Sunday, 5 Jan 2014 09:03:07`
    pub fn pretty_time(timestamp: DateTime<Utc>) -> String {
        timestamp.format("%A, %-d %b %Y %H:%M:%S").to_string()
    }

    /// Whole minutes elapsed since `since`, floored and never negative
    pub fn idle_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - since).num_seconds().max(0) / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_pretty_time() {
        let ts = Utc.with_ymd_and_hms(2014, 1, 5, 9, 3, 7).unwrap();
        assert_eq!(time::pretty_time(ts), "Sunday, 5 Jan 2014 09:03:07");
    }

    #[test]
    fn test_idle_minutes_floors() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(time::idle_minutes(start, start), 0);
        assert_eq!(time::idle_minutes(start, start + Duration::seconds(59)), 0);
        assert_eq!(time::idle_minutes(start, start + Duration::seconds(90)), 1);
        assert_eq!(time::idle_minutes(start, start + Duration::seconds(600)), 10);
        // Clock skew never yields negative idle time
        assert_eq!(time::idle_minutes(start, start - Duration::seconds(30)), 0);
    }

    #[test]
    fn test_count_noun() {
        assert_eq!(string::count_noun(1, "user", "users"), "1 user");
        assert_eq!(string::count_noun(0, "user", "users"), "0 users");
        assert_eq!(string::count_noun(7, "user", "users"), "7 users");
    }

    #[test]
    fn test_escape_message() {
        assert_eq!(string::escape_message("hi\r\nthere\0"), "hithere");
        assert_eq!(string::escape_message("plain text"), "plain text");
    }
}
