use serde_json::{Map, Value};
use thiserror::Error;

use super::config::SchemaKeys;
use super::records::{Departures, Schedule};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),
}

/// Which layout a cache document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// One flat list of records under the legacy key
    Legacy,
    /// Separate outbound and inbound lists
    Current,
}

impl SourceFormat {
    // The legacy key wins even when the current keys are present too.
    // TODO: drop the legacy branch once no cache files in the old layout remain.
    pub fn detect(document: &Map<String, Value>, keys: &SchemaKeys) -> Self {
        if document.contains_key(&keys.legacy_key) {
            SourceFormat::Legacy
        } else {
            SourceFormat::Current
        }
    }
}

/// Turns a decoded cache document into a `Schedule`.
///
/// Only the top level is inspected. Individual records are carried over as
/// they are, however broken, and a direction that is not a list is kept as
/// `Departures::Malformed`.
pub fn normalize(document: Value, keys: &SchemaKeys) -> Result<Schedule, NormalizeError> {
    let mut document = match document {
        Value::Object(document) => document,
        other => return Err(NormalizeError::NotAnObject(json_kind(&other))),
    };

    let last_updated = document
        .remove(&keys.last_updated_key)
        .unwrap_or_else(|| Value::String(String::new()));

    let schedule = match SourceFormat::detect(&document, keys) {
        SourceFormat::Legacy => Schedule {
            outbound: take_departures(&mut document, &keys.legacy_key),
            inbound: Departures::default(),
            last_updated,
            station_metadata: Value::Object(Map::new()),
        },
        SourceFormat::Current => Schedule {
            outbound: take_departures(&mut document, &keys.outbound_key),
            inbound: take_departures(&mut document, &keys.inbound_key),
            last_updated,
            // Kept as found, even when it is not an object
            station_metadata: document
                .remove(&keys.stations_key)
                .unwrap_or_else(|| Value::Object(Map::new())),
        },
    };
    Ok(schedule)
}

fn take_departures(document: &mut Map<String, Value>, key: &str) -> Departures {
    document
        .remove(key)
        .map(Departures::from_value)
        .unwrap_or_default()
}

/// Writes a schedule back out in the current layout.
pub fn to_document(schedule: &Schedule, keys: &SchemaKeys) -> Value {
    let mut document = Map::new();
    document.insert(keys.outbound_key.clone(), schedule.outbound.to_value());
    document.insert(keys.inbound_key.clone(), schedule.inbound.to_value());
    document.insert(keys.last_updated_key.clone(), schedule.last_updated.clone());
    document.insert(keys.stations_key.clone(), schedule.station_metadata.clone());
    Value::Object(document)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
