//! Fusion settings
//!
//! Every field has a default, so a settings file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!     "log": { "timestamp_field": "time", "time_unit": "milliseconds" },
//!     "position": { "gps_utc_offset_s": 18 },
//!     "max_time_gap_ms": 500
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GeoFuseError, Result};
use crate::geojson::OutputOptions;
use crate::position::PosLoadOptions;
use crate::timelog::LogLoadOptions;

/// Settings for one fusion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfig {
    /// How to read the timestamp log
    pub log: LogLoadOptions,

    /// How to read the position track
    pub position: PosLoadOptions,

    /// How to write the GeoJSON document
    pub output: OutputOptions,

    /// Matches further apart than this are reported as stale (never dropped)
    pub max_time_gap_ms: Option<f64>,
}

impl FusionConfig {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| GeoFuseError::io(path, e))?;
        let config: FusionConfig = serde_json::from_str(&content)
            .map_err(|e| GeoFuseError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.log.timestamp_field.is_empty() {
            return Err(GeoFuseError::Config(
                "log.timestamp_field must not be empty".to_string(),
            ));
        }
        if !self.position.gps_utc_offset_s.is_finite() {
            return Err(GeoFuseError::Config(
                "position.gps_utc_offset_s must be finite".to_string(),
            ));
        }
        if let Some(gap) = self.max_time_gap_ms {
            if !gap.is_finite() || gap < 0.0 {
                return Err(GeoFuseError::Config(format!(
                    "max_time_gap_ms must be a non-negative number, got {}",
                    gap
                )));
            }
        }
        Ok(())
    }

    /// Staleness threshold in nanoseconds
    pub fn max_time_gap_nanos(&self) -> Option<u64> {
        self.max_time_gap_ms.map(|ms| (ms * 1e6).round() as u64)
    }
}
