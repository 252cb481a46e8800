//! GNSS Position Tracks
//!
//! Loads RTKLIB-style `.pos` solution files into a time-sorted track.

mod parser;

pub use parser::PosLoadOptions;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{read_input, InputSource, Result};
use crate::time::Timestamp;

/// Time system declared by the `.pos` column header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeSystem {
    /// GPS time, no leap seconds
    #[default]
    Gpst,
    /// Coordinated universal time
    Utc,
}

/// A single position fix
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    /// Fix time (after any GPST->UTC shift)
    pub timestamp: Timestamp,
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Ellipsoidal height in meters
    pub altitude: Option<f64>,
    /// Solution quality flag (1 = fix, 2 = float, ..., 5 = single)
    pub quality: Option<u8>,
    /// Number of satellites used
    pub satellites: Option<u16>,
    /// 1-based line in the source file
    pub line: usize,
}

impl PositionSample {
    /// Create a sample with only the mandatory fields
    pub fn new(timestamp: Timestamp, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            altitude: None,
            quality: None,
            satellites: None,
            line: 0,
        }
    }

    /// Set the altitude
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

/// Position samples sorted ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionTrack {
    /// Time system the file declared
    pub time_system: TimeSystem,
    samples: Vec<PositionSample>,
}

impl PositionTrack {
    /// Build a track from samples in any order.
    ///
    /// Sorting is stable, so samples sharing a timestamp keep their input order.
    pub fn from_samples(mut samples: Vec<PositionSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self {
            time_system: TimeSystem::default(),
            samples,
        }
    }

    /// Load a track from a `.pos` file
    pub fn from_file<P: AsRef<Path>>(path: P, options: &PosLoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = read_input(path)?;
        parser::parse(&content, &InputSource::file(path), options)
    }

    /// Parse a track from `.pos` text
    pub fn from_pos_str(content: &str, options: &PosLoadOptions) -> Result<Self> {
        parser::parse(content, &InputSource::Inline, options)
    }

    /// Samples in ascending time order
    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the track has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First and last sample times
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.samples.first()?.timestamp, self.samples.last()?.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_is_stable() {
        let mut a = PositionSample::new(Timestamp::from_nanos(5), 1.0, 1.0);
        a.line = 1;
        let mut b = PositionSample::new(Timestamp::from_nanos(1), 2.0, 2.0);
        b.line = 2;
        let mut c = PositionSample::new(Timestamp::from_nanos(5), 3.0, 3.0);
        c.line = 3;

        let track = PositionTrack::from_samples(vec![a, b, c]);
        let lines: Vec<usize> = track.samples().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 1, 3]);
        assert_eq!(
            track.time_span(),
            Some((Timestamp::from_nanos(1), Timestamp::from_nanos(5)))
        );
    }
}
