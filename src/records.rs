use serde::Deserialize;
use serde_json::{Map, Value};

/// One train event as found in the cache file.
///
/// Nothing is validated on the way in. The wrapped value may be an object with
/// any subset of the expected keys, or not an object at all; every accessor
/// independently falls back to "absent" when the shape is wrong.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleRecord(pub Value);

impl ScheduleRecord {
    fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object()?.get(key)
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.field(key)?.as_str()
    }

    /// Scheduled departure, expected as "HH:MM".
    pub fn departure_time(&self) -> Option<&str> {
        self.string_field("ti")
    }

    pub fn station_name(&self) -> Option<&str> {
        self.string_field("st")
    }

    /// Train identifier or line, e.g. "REX 3 (Zug-Nr. 19222)".
    pub fn service_label(&self) -> Option<&str> {
        self.string_field("pr")
    }

    pub fn platform(&self) -> Option<String> {
        match self.field("tr")? {
            Value::String(platform) => Some(platform.clone()),
            Value::Number(platform) => Some(platform.to_string()),
            _ => None,
        }
    }

    /// Observed departure from the realtime block (`rt.dlt`).
    pub fn actual_time(&self) -> Option<&str> {
        self.field("rt")?.as_object()?.get("dlt")?.as_str()
    }
}

/// The records for one direction.
///
/// A direction that is present in the source but is not a list is kept as
/// `Malformed` with its value untouched rather than being coerced.
#[derive(Clone, Debug, PartialEq)]
pub enum Departures {
    Records(Vec<ScheduleRecord>),
    Malformed(Value),
}

impl Default for Departures {
    fn default() -> Self {
        Departures::Records(Vec::new())
    }
}

impl Departures {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                Departures::Records(items.into_iter().map(ScheduleRecord).collect())
            }
            other => Departures::Malformed(other),
        }
    }

    /// Records usable for display; a malformed direction has none.
    pub fn records(&self) -> &[ScheduleRecord] {
        match self {
            Departures::Records(records) => records,
            Departures::Malformed(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn to_value(&self) -> Value {
        match self {
            Departures::Records(records) => {
                Value::Array(records.iter().map(|record| record.0.clone()).collect())
            }
            Departures::Malformed(value) => value.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StationInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// A whole cached snapshot, rebuilt from disk on every load.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    pub outbound: Departures,
    pub inbound: Departures,
    pub last_updated: Value,
    /// Raw `stations` entry; only an object yields lookups
    pub station_metadata: Value,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            outbound: Departures::default(),
            inbound: Departures::default(),
            last_updated: Value::String(String::new()),
            station_metadata: Value::Object(Map::new()),
        }
    }
}

impl Schedule {
    /// The recorded timestamp, if it is a non-empty string.
    pub fn timestamp(&self) -> Option<&str> {
        self.last_updated.as_str().filter(|timestamp| !timestamp.is_empty())
    }

    pub fn departures(&self, direction: Direction) -> &Departures {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    pub fn station(&self, key: &str) -> Option<StationInfo> {
        let entry = self.station_metadata.as_object()?.get(key)?;
        serde_json::from_value(entry.clone()).ok()
    }
}

/// Both directions exactly as held, or two empty lists when nothing is loaded.
pub fn get_direction_data(schedule: Option<&Schedule>) -> (Departures, Departures) {
    match schedule {
        Some(schedule) => (schedule.outbound.clone(), schedule.inbound.clone()),
        None => (Departures::default(), Departures::default()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}
