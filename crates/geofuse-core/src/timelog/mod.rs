//! Timestamp Logs
//!
//! Loads the JSON logs describing events that need geolocating: camera frame
//! lists, sensor captures, or any array of records carrying a timestamp.

mod parser;

pub use parser::LogLoadOptions;

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{read_input, InputSource, Result};
use crate::time::Timestamp;

/// A single log record with its timestamp and untouched payload
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Position of the record in the source document
    pub index: usize,
    /// When the event happened
    pub timestamp: Timestamp,
    /// All other fields of the record, in document order
    pub payload: Map<String, Value>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(index: usize, timestamp: Timestamp, payload: Map<String, Value>) -> Self {
        Self {
            index,
            timestamp,
            payload,
        }
    }
}

/// A loaded log: document-level metadata plus its entries in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampLog {
    /// Top-level fields other than the record array (`filename`, `device_alias`, ...)
    pub metadata: Map<String, Value>,
    /// Entries in file order
    pub entries: Vec<LogEntry>,
}

impl TimestampLog {
    /// Load a log from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P, options: &LogLoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = read_input(path)?;
        parser::parse(&content, &InputSource::file(path), options)
    }

    /// Parse a log from a JSON string
    pub fn from_json_str(content: &str, options: &LogLoadOptions) -> Result<Self> {
        parser::parse(content, &InputSource::Inline, options)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest and latest entry timestamps
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.entries.iter().map(|e| e.timestamp).min()?;
        let last = self.entries.iter().map(|e| e.timestamp).max()?;
        Some((first, last))
    }
}
