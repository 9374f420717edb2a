use chrono::{DateTime, Duration, Utc};

use fhiro_types::api::WaitlistStats;
use fhiro_types::models::WaitlistEntry;

/// Width of the "this week" window.
pub const RECENT_WINDOW: Duration = Duration::hours(7 * 24);

/// Most frequent value. Ties go to the value seen first.
pub fn most_frequent<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    // (value, count) in first-seen order
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((value, n));
        }
    }
    best.map(|(v, _)| v.to_string())
}

/// Entries created strictly after `now - RECENT_WINDOW`. Null timestamps never count.
pub fn count_recent(entries: &[WaitlistEntry], now: DateTime<Utc>) -> usize {
    let cutoff = now - RECENT_WINDOW;
    entries
        .iter()
        .filter(|e| e.created_at.is_some_and(|t| t > cutoff))
        .count()
}

/// Headline numbers for the waitlist tab, over the whole list.
pub fn waitlist_stats(entries: &[WaitlistEntry], now: DateTime<Utc>) -> WaitlistStats {
    WaitlistStats {
        total: entries.len(),
        this_week: count_recent(entries, now),
        top_specialty: most_frequent(entries.iter().map(|e| e.specialty.as_str())),
        top_location: most_frequent(entries.iter().map(|e| e.location.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn entry(specialty: &str, location: &str, created_at: Option<DateTime<Utc>>) -> WaitlistEntry {
        WaitlistEntry {
            id: Uuid::new_v4(),
            name: "n".into(),
            email: "e@x.ie".into(),
            specialty: specialty.into(),
            location: location.into(),
            source: "landing_page".into(),
            created_at,
        }
    }

    #[test]
    fn most_frequent_prefers_first_seen_on_tie() {
        assert_eq!(most_frequent(["b", "a", "a", "b"]), Some("b".into()));
        assert_eq!(most_frequent(["a", "b", "b"]), Some("b".into()));
        assert_eq!(most_frequent(["x"]), Some("x".into()));
        assert_eq!(most_frequent(Vec::<&str>::new()), None);
    }

    #[test]
    fn recent_window_is_exclusive_and_skips_nulls() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let entries = vec![
            entry("a", "x", Some(now - Duration::hours(1))),
            entry("a", "x", Some(now - RECENT_WINDOW)),
            entry("a", "x", Some(now - RECENT_WINDOW + Duration::seconds(1))),
            entry("a", "x", Some(now - Duration::days(30))),
            entry("a", "x", None),
        ];
        assert_eq!(count_recent(&entries, now), 2);
    }

    #[test]
    fn stats_cover_whole_list() {
        let now = Utc::now();
        let entries = vec![
            entry("Cardiology", "Dublin", Some(now)),
            entry("Neurology", "Cork", Some(now - Duration::days(10))),
            entry("Neurology", "Dublin", None),
        ];
        let stats = waitlist_stats(&entries, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.this_week, 1);
        assert_eq!(stats.top_specialty.as_deref(), Some("Neurology"));
        assert_eq!(stats.top_location.as_deref(), Some("Dublin"));
    }

    #[test]
    fn empty_list_has_no_top_values() {
        let stats = waitlist_stats(&[], Utc::now());
        assert_eq!(stats, WaitlistStats::default());
    }
}
