use chrono::{DateTime, Utc};

use crate::models::CatalogRecord;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// "7.9 (6,012)" style rating, or "unrated".
pub fn format_rating(record: &CatalogRecord) -> String {
    match (record.vote_average, record.vote_count) {
        (Some(avg), Some(count)) if count > 0 => {
            format!("{:.1} ({})", avg, group_thousands(count))
        }
        (Some(avg), None) => format!("{:.1}", avg),
        _ => "unrated".to_string(),
    }
}

pub fn format_release(record: &CatalogRecord) -> String {
    record
        .release_date
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "TBA".to_string())
}

/// How long ago `at` was, relative to `now`, e.g. "5m ago".
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - at).num_minutes();
    if minutes < 1 {
        // Includes clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", (minutes + 30) / 60)
    } else {
        format!("{}d ago", (minutes + 720) / 1440)
    }
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Amélie", 3), "Amé");
    }

    #[test]
    fn test_format_rating() {
        let mut record = CatalogRecord::new(1, "Heat");
        assert_eq!(format_rating(&record), "unrated");

        record.vote_average = Some(7.94);
        record.vote_count = Some(1234567);
        assert_eq!(format_rating(&record), "7.9 (1,234,567)");

        record.vote_count = Some(0);
        assert_eq!(format_rating(&record), "unrated");
    }

    #[test]
    fn test_format_release() {
        let mut record = CatalogRecord::new(1, "Heat");
        assert_eq!(format_release(&record), "TBA");
        record.release_date = NaiveDate::from_ymd_opt(1995, 12, 15);
        assert_eq!(format_release(&record), "Dec 15, 1995");
    }

    #[test]
    fn test_format_age_rounds() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now + Duration::minutes(5), now), "just now");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - Duration::minutes(89), now), "1h ago");
        assert_eq!(format_age(now - Duration::minutes(90), now), "2h ago");
        assert_eq!(format_age(now - Duration::hours(36), now), "2d ago");
    }
}
