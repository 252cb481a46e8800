//! JSON log parsing
//!
//! Two document shapes are understood:
//! - a bare array of record objects;
//! - an object holding the records under `records_field`, every other key
//!   being document metadata. Records there may also be `[index, timestamp]`
//!   pairs, the layout used by camera frame logs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{LogEntry, TimestampLog};
use crate::error::{GeoFuseError, InputSource, Result};
use crate::time::{TimeUnit, Timestamp};

/// Settings for reading a timestamp log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogLoadOptions {
    /// Field holding each record's timestamp
    pub timestamp_field: String,

    /// Key of the record array when the document is an object
    pub records_field: String,

    /// Unit of numeric timestamps
    pub time_unit: TimeUnit,
}

impl Default for LogLoadOptions {
    fn default() -> Self {
        Self {
            timestamp_field: "timestamp".to_string(),
            records_field: "timestamps".to_string(),
            time_unit: TimeUnit::Nanoseconds,
        }
    }
}

pub(super) fn parse(
    content: &str,
    source: &InputSource,
    options: &LogLoadOptions,
) -> Result<TimestampLog> {
    let document: Value = serde_json::from_str(content).map_err(|e| {
        GeoFuseError::malformed(source, Some(e.line()), format!("invalid JSON: {}", e))
    })?;

    let (metadata, records) = match document {
        Value::Array(records) => (Map::new(), records),
        Value::Object(mut object) => {
            let records = match object.shift_remove(&options.records_field) {
                Some(Value::Array(records)) => records,
                Some(_) => {
                    return Err(GeoFuseError::malformed(
                        source,
                        None,
                        format!("'{}' is not an array", options.records_field),
                    ))
                }
                None => {
                    return Err(GeoFuseError::malformed(
                        source,
                        None,
                        format!("no '{}' array in log object", options.records_field),
                    ))
                }
            };
            (object, records)
        }
        _ => {
            return Err(GeoFuseError::malformed(
                source,
                None,
                "expected an array of records or an object holding one",
            ))
        }
    };

    let entries = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record, source, options))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Loaded {} log entries ({} metadata fields) from {}",
        entries.len(),
        metadata.len(),
        source
    );

    Ok(TimestampLog { metadata, entries })
}

fn parse_record(
    index: usize,
    record: Value,
    source: &InputSource,
    options: &LogLoadOptions,
) -> Result<LogEntry> {
    let (raw_timestamp, payload) = match record {
        Value::Object(mut payload) => match payload.shift_remove(&options.timestamp_field) {
            Some(raw) => (raw, payload),
            None => {
                return Err(GeoFuseError::MissingField {
                    input: source.clone(),
                    record: index,
                    field: options.timestamp_field.clone(),
                })
            }
        },
        Value::Array(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            let frame = pair.next().unwrap_or(Value::Null);
            let raw = pair.next().unwrap_or(Value::Null);
            let mut payload = Map::new();
            payload.insert("index".to_string(), frame);
            (raw, payload)
        }
        other => {
            return Err(GeoFuseError::malformed(
                source,
                None,
                format!(
                    "record {}: expected an object or an [index, timestamp] pair, got {}",
                    index,
                    json_kind(&other)
                ),
            ))
        }
    };

    let timestamp = Timestamp::from_json(&raw_timestamp, options.time_unit).ok_or_else(|| {
        GeoFuseError::malformed(
            source,
            None,
            format!(
                "record {}: cannot interpret {} as a timestamp",
                index, raw_timestamp
            ),
        )
    })?;

    Ok(LogEntry::new(index, timestamp, payload))
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
