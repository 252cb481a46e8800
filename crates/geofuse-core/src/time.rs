//! Timestamps shared by the log and position loaders
//!
//! Every instant is held as signed nanoseconds since the Unix epoch so the
//! matcher can compare and subtract them without any calendar arithmetic.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Naive layouts accepted for calendar timestamps, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Unit applied to bare numeric timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds since the Unix epoch (camera frame logs)
    #[default]
    Nanoseconds,
    /// Microseconds since the Unix epoch
    Microseconds,
    /// Milliseconds since the Unix epoch
    Milliseconds,
    /// Seconds since the Unix epoch
    Seconds,
}

impl TimeUnit {
    /// Nanoseconds per unit
    pub fn nanos(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => NANOS_PER_SEC,
        }
    }
}

/// An instant as nanoseconds since 1970-01-01T00:00:00Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create from raw nanoseconds
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Raw nanoseconds since the epoch
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Signed difference `self - other` in nanoseconds, saturating at the i64 range
    pub fn delta_nanos(self, other: Timestamp) -> i64 {
        self.0.saturating_sub(other.0)
    }

    /// Absolute distance to another instant in nanoseconds
    pub fn abs_diff(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Shift by a number of nanoseconds
    pub fn offset_nanos(self, nanos: i64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Scale an integer count of `unit` into a timestamp
    pub fn from_integer(value: i64, unit: TimeUnit) -> Option<Self> {
        value.checked_mul(unit.nanos()).map(Self)
    }

    /// Scale a fractional count of `unit` into a timestamp
    pub fn from_float(value: f64, unit: TimeUnit) -> Option<Self> {
        let nanos = value * unit.nanos() as f64;
        if nanos.is_finite() && nanos >= i64::MIN as f64 && nanos <= i64::MAX as f64 {
            Some(Self(nanos.round() as i64))
        } else {
            None
        }
    }

    /// Convert from a chrono UTC datetime
    pub fn from_datetime(dt: DateTime<Utc>) -> Option<Self> {
        dt.timestamp_nanos_opt().map(Self)
    }

    /// Convert to a chrono UTC datetime
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    /// Parse a textual timestamp.
    ///
    /// Accepts RFC 3339, the RTKLIB `YYYY/MM/DD HH:MM:SS.fff` layout, its
    /// dashed variant, and bare numbers scaled by `unit`.
    pub fn parse_str(s: &str, unit: TimeUnit) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Self::from_datetime(dt.with_timezone(&Utc));
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Self::from_datetime(naive.and_utc());
            }
        }

        if let Ok(value) = s.parse::<i64>() {
            return Self::from_integer(value, unit);
        }
        s.parse::<f64>().ok().and_then(|v| Self::from_float(v, unit))
    }

    /// Interpret a JSON value as a timestamp
    pub fn from_json(value: &Value, unit: TimeUnit) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::from_integer(i, unit)
                } else if let Some(u) = n.as_u64() {
                    i64::try_from(u).ok().and_then(|i| Self::from_integer(i, unit))
                } else {
                    n.as_f64().and_then(|f| Self::from_float(f, unit))
                }
            }
            Value::String(s) => Self::parse_str(s, unit),
            _ => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_datetime().to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )
    }
}
