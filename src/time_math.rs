use std::str::FromStr;

/// Sentinel shown when a departure time is missing.
pub const MISSING_TIME: &str = "N/A";

/// A value for time past midnight in minutes.
/// For example 08:30 is 510 minutes past midnight. Hours and minutes are not
/// range checked, so "25:70" is 1570.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct MinutesPastMidnight(pub i64);

impl FromStr for MinutesPastMidnight {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the first two colon-delimited fields count, "10:30:45" is 10:30
        let mut fields = s.split(':');
        let hours = fields.next().ok_or(())?.trim().parse::<i64>().map_err(|_| ())?;
        let minutes = fields.next().ok_or(())?.trim().parse::<i64>().map_err(|_| ())?;
        hours
            .checked_mul(60)
            .and_then(|hours| hours.checked_add(minutes))
            .map(MinutesPastMidnight)
            .ok_or(())
    }
}

pub fn parse_time_to_minutes(s: &str) -> Option<i64> {
    MinutesPastMidnight::from_str(s).ok().map(|minutes| minutes.0)
}

/// Signed minutes between the scheduled and actual "HH:MM" strings.
///
/// Returns 0 whenever either side is missing or does not parse, or when the
/// difference does not fit in an `i64`. There is no wraparound at midnight:
/// 23:58 -> 00:02 is -1436.
pub fn calculate_delay(scheduled: Option<&str>, actual: Option<&str>) -> i64 {
    let (Some(scheduled), Some(actual)) = (scheduled, actual) else {
        return 0;
    };
    match (parse_time_to_minutes(scheduled), parse_time_to_minutes(actual)) {
        (Some(scheduled), Some(actual)) => actual.checked_sub(scheduled).unwrap_or(0),
        _ => 0,
    }
}

pub fn format_time(s: Option<&str>) -> String {
    match s {
        Some(time) if !time.is_empty() => time.to_string(),
        _ => MISSING_TIME.to_string(),
    }
}
