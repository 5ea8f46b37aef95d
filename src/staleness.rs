use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;

use super::records::Schedule;

/// Parses an ISO-8601 timestamp carrying either a `Z` or a numeric offset.
///
/// Fractional seconds of any precision are accepted, and the seconds may be
/// left out entirely. A timestamp without any offset does not parse.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    let timestamp = timestamp.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed);
    }
    // The format strings below only know numeric offsets
    let timestamp = match timestamp.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{local}+00:00"),
        None => timestamp.to_string(),
    };
    DateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .or_else(|_| DateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M%z"))
        .or_else(|_| DateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M%z"))
        .ok()
}

fn age_exceeds(schedule: &Schedule, max_age_seconds: i64, now: DateTime<Utc>) -> bool {
    let Some(recorded) = schedule.timestamp().and_then(parse_timestamp) else {
        return true;
    };
    // A threshold too large for a Duration can never be exceeded
    match Duration::try_seconds(max_age_seconds) {
        Some(max_age) => now.signed_duration_since(recorded) > max_age,
        None => max_age_seconds < 0,
    }
}

/// Missing data, or data without a readable timestamp, is always stale.
pub fn is_stale_at(schedule: Option<&Schedule>, max_age_seconds: i64, now: DateTime<Utc>) -> bool {
    match schedule {
        Some(schedule) => age_exceeds(schedule, max_age_seconds, now),
        None => true,
    }
}

pub fn is_stale(schedule: Option<&Schedule>, max_age_seconds: i64) -> bool {
    is_stale_at(schedule, max_age_seconds, Utc::now())
}

/// Unlike `is_stale`, nothing loaded means nothing to refresh.
pub fn should_auto_refresh_at(
    schedule: Option<&Schedule>,
    refresh_interval_seconds: i64,
    now: DateTime<Utc>,
) -> bool {
    match schedule {
        Some(schedule) => age_exceeds(schedule, refresh_interval_seconds, now),
        None => false,
    }
}

pub fn should_auto_refresh(schedule: Option<&Schedule>, refresh_interval_seconds: i64) -> bool {
    should_auto_refresh_at(schedule, refresh_interval_seconds, Utc::now())
}

/// Local wall-clock time of the recorded timestamp as "HH:MM:SS".
pub fn format_last_updated_display(timestamp: Option<&str>, timezone: Tz) -> Option<String> {
    let recorded = parse_timestamp(timestamp.filter(|timestamp| !timestamp.is_empty())?)?;
    Some(recorded.with_timezone(&timezone).format("%H:%M:%S").to_string())
}
