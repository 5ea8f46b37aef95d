use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;

use super::config::DirectionLabels;
use super::records::{Departures, Direction, ScheduleRecord};
use super::time_math::{calculate_delay, format_time};

pub const ON_TIME: &str = "✓ On time";
pub const NO_DELAY: &str = "—";
pub const UNKNOWN_TRAIN: &str = "Unknown";
pub const PLATFORM_TBA: &str = "TBA";
pub const UNKNOWN_STATION: &str = "—";
const TAB_PREFIX: &str = "🚂";

/// One line of the departures table, already reduced to display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartureRow {
    #[serde(rename = "Departure")]
    pub departure: String,
    #[serde(rename = "Actual")]
    pub actual: String,
    #[serde(rename = "Delay (min)")]
    pub delay: String,
    #[serde(rename = "Train")]
    pub train: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Station")]
    pub station: String,
}

impl DepartureRow {
    /// Each column falls back to its own sentinel, so a broken record still
    /// produces a row.
    pub fn from_record(record: &ScheduleRecord) -> Self {
        let actual_time = record.actual_time();
        let delay = calculate_delay(record.departure_time(), actual_time);
        DepartureRow {
            departure: format_time(record.departure_time()),
            actual: actual_time.unwrap_or(ON_TIME).to_string(),
            delay: if delay > 0 {
                delay.to_string()
            } else {
                NO_DELAY.to_string()
            },
            train: record.service_label().unwrap_or(UNKNOWN_TRAIN).to_string(),
            platform: record.platform().unwrap_or_else(|| PLATFORM_TBA.to_string()),
            station: record.station_name().unwrap_or(UNKNOWN_STATION).to_string(),
        }
    }
}

/// Rows in source order. A direction that is not a list has no rows.
pub fn build_rows(departures: &Departures) -> Vec<DepartureRow> {
    departures
        .records()
        .iter()
        .map(DepartureRow::from_record)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabOrder {
    pub is_afternoon: bool,
    pub tabs: [(Direction, String); 2],
}

/// Morning shows the outbound commute first, from noon on the way home.
pub fn determine_tab_order(now: DateTime<Tz>, labels: &DirectionLabels) -> TabOrder {
    let outbound = (Direction::Outbound, format!("{TAB_PREFIX} {}", labels.outbound));
    let inbound = (Direction::Inbound, format!("{TAB_PREFIX} {}", labels.inbound));
    let is_afternoon = now.hour() >= 12;
    let tabs = if is_afternoon {
        [inbound, outbound]
    } else {
        [outbound, inbound]
    };
    TabOrder { is_afternoon, tabs }
}

pub fn render_table(title: &str, rows: &[DepartureRow]) -> String {
    let mut out = format!("{title}\n");
    if rows.is_empty() {
        out.push_str("  No departures found for this direction.\n");
        return out;
    }

    let header = ["Departure", "Actual", "Delay (min)", "Train", "Platform", "Station"];
    let cells: Vec<[&str; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.departure.as_str(),
                row.actual.as_str(),
                row.delay.as_str(),
                row.train.as_str(),
                row.platform.as_str(),
                row.station.as_str(),
            ]
        })
        .collect();

    let mut widths = header.map(|column| column.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for line in std::iter::once(&header).chain(cells.iter()) {
        let padded: Vec<String> = line
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let padding = width - cell.chars().count();
                format!("{cell}{}", " ".repeat(padding))
            })
            .collect();
        out.push_str("  ");
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Vienna;
    use serde_json::{Value, json};

    fn rows_for(records: Value) -> Vec<DepartureRow> {
        build_rows(&Departures::from_value(records))
    }

    #[test]
    fn test_rows_from_sample_data() {
        let rows = rows_for(json!([
            {"ti": "10:17", "st": "Wien Praterstern Bahnhof", "pr": "REX 3 (Zug-Nr. 19222)", "tr": "2", "rt": {"dlt": "10:19"}},
            {"ti": "10:47", "st": "Wien Hauptbahnhof", "pr": "REX 3 (Zug-Nr. 19224)", "tr": "1"},
            {"ti": "11:17", "st": "Wien Praterstern Bahnhof", "pr": "REX 3 (Zug-Nr. 19226)", "tr": "2", "rt": {"dlt": "11:22"}}
        ]));
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            DepartureRow {
                departure: "10:17".to_string(),
                actual: "10:19".to_string(),
                delay: "2".to_string(),
                train: "REX 3 (Zug-Nr. 19222)".to_string(),
                platform: "2".to_string(),
                station: "Wien Praterstern Bahnhof".to_string(),
            }
        );
        assert_eq!(rows[1].actual, ON_TIME);
        assert_eq!(rows[1].delay, NO_DELAY);
        assert_eq!(rows[1].platform, "1");
        assert_eq!(rows[2].delay, "5");
    }

    #[test]
    fn test_delay_column() {
        let cases = [
            ("10:17", Some("10:17"), NO_DELAY, "10:17"),
            ("10:17", Some("10:32"), "15", "10:32"),
            ("09:58", Some("10:03"), "5", "10:03"),
            ("10:17", Some("10:15"), NO_DELAY, "10:15"),
            ("23:58", Some("00:02"), NO_DELAY, "00:02"),
            ("10:17", None, NO_DELAY, ON_TIME),
        ];
        for (scheduled, actual, delay, shown) in cases {
            let record = match actual {
                Some(actual) => json!({"ti": scheduled, "rt": {"dlt": actual}}),
                None => json!({"ti": scheduled, "rt": null}),
            };
            let row = DepartureRow::from_record(&ScheduleRecord(record));
            assert_eq!(row.delay, delay, "{scheduled} -> {actual:?}");
            assert_eq!(row.actual, shown, "{scheduled} -> {actual:?}");
        }
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let rows = rows_for(json!([
            {"ti": "10:17"},
            {"ti": "10:47", "st": "Wien Hauptbahnhof", "pr": "REX 3 (Zug-Nr. 19224)"}
        ]));
        assert_eq!(rows[0].departure, "10:17");
        assert_eq!(rows[0].train, UNKNOWN_TRAIN);
        assert_eq!(rows[0].platform, PLATFORM_TBA);
        assert_eq!(rows[0].station, UNKNOWN_STATION);
        assert_eq!(rows[1].platform, PLATFORM_TBA);
        assert_eq!(rows[1].train, "REX 3 (Zug-Nr. 19224)");
    }

    #[test]
    fn test_malformed_records_still_produce_rows() {
        let rows = rows_for(json!([
            {},
            {"ti": null},
            {"ti": "10:17", "pr": null, "tr": null},
            {"not_standard_keys": "values"},
            null,
            {"ti": "invalid-time", "rt": {"dlt": "also-invalid"}}
        ]));
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].departure, "N/A");
        assert_eq!(rows[1].departure, "N/A");
        assert_eq!(rows[2].train, UNKNOWN_TRAIN);
        assert_eq!(rows[2].platform, PLATFORM_TBA);
        assert_eq!(rows[4].actual, ON_TIME);
        assert_eq!(rows[5].departure, "invalid-time");
        assert_eq!(rows[5].actual, "also-invalid");
        assert_eq!(rows[5].delay, NO_DELAY);
    }

    #[test]
    fn test_malformed_direction_has_no_rows() {
        assert!(rows_for(json!("corrupted - should be list")).is_empty());
        assert!(rows_for(json!({"not": "a list"})).is_empty());
    }

    #[test]
    fn test_row_serializes_with_column_names() {
        let row = DepartureRow::from_record(&ScheduleRecord(json!({"ti": "10:17"})));
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["Departure"], "10:17");
        assert_eq!(value["Actual"], ON_TIME);
        assert_eq!(value["Delay (min)"], NO_DELAY);
        assert_eq!(value["Train"], UNKNOWN_TRAIN);
        assert_eq!(value["Platform"], PLATFORM_TBA);
        assert_eq!(value["Station"], UNKNOWN_STATION);

        let row = DepartureRow::from_record(&ScheduleRecord(json!({"ti": "10:17", "st": "Wien Hauptbahnhof"})));
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["Station"], "Wien Hauptbahnhof");
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_tab_order() {
        let labels = DirectionLabels::default();

        let morning = determine_tab_order(Vienna.with_ymd_and_hms(2025, 7, 27, 9, 30, 0).unwrap(), &labels);
        assert!(!morning.is_afternoon);
        assert_eq!(morning.tabs[0], (Direction::Outbound, "🚂 Bad Vöslau → Wien Hbf".to_string()));
        assert_eq!(morning.tabs[1], (Direction::Inbound, "🚂 Wien Hbf → Bad Vöslau".to_string()));

        let afternoon = determine_tab_order(Vienna.with_ymd_and_hms(2025, 7, 27, 15, 30, 0).unwrap(), &labels);
        assert!(afternoon.is_afternoon);
        assert_eq!(afternoon.tabs[0].0, Direction::Inbound);
    }

    #[test]
    fn test_tab_order_boundaries() {
        let labels = DirectionLabels::default();
        let at = |hour, minute| {
            determine_tab_order(Vienna.with_ymd_and_hms(2025, 7, 27, hour, minute, 0).unwrap(), &labels)
        };
        assert!(at(12, 0).is_afternoon);
        assert!(!at(11, 59).is_afternoon);
        assert!(!at(0, 0).is_afternoon);
        assert!(at(23, 30).is_afternoon);
    }

    #[test]
    fn test_render_table() {
        let rows = rows_for(json!([
            {"ti": "10:17", "pr": "REX 3", "tr": "2", "rt": {"dlt": "10:19"}},
            {"ti": "10:47", "pr": "REX 3", "tr": 1}
        ]));
        let table = render_table("Bad Vöslau → Wien Hbf", &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Bad Vöslau → Wien Hbf");
        assert!(lines[1].starts_with("  Departure  Actual"));
        assert!(lines[2].contains("10:19"));
        assert!(lines[3].contains(ON_TIME));
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_table("Wien Hbf → Bad Vöslau", &[]);
        assert!(table.contains("No departures found"));
    }
}
