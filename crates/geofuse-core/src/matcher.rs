//! Nearest-timestamp matching
//!
//! Pairs every log entry with the position sample closest to it in time.
//! The track is sorted, so each lookup is a binary search for the insertion
//! point followed by a comparison of the two neighbours.

use tracing::debug;

use crate::error::{GeoFuseError, Result};
use crate::position::{PositionSample, PositionTrack};
use crate::time::Timestamp;
use crate::timelog::LogEntry;

/// A log entry together with the position it was matched to
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRecord<'a> {
    /// The log entry being geotagged
    pub entry: &'a LogEntry,
    /// The closest position sample
    pub sample: &'a PositionSample,
    /// `entry.timestamp - sample.timestamp` in nanoseconds
    pub time_delta: i64,
}

impl MatchedRecord<'_> {
    /// Absolute time gap between the entry and its position
    pub fn gap_nanos(&self) -> u64 {
        self.time_delta.unsigned_abs()
    }
}

/// Index of the sample nearest to `t` in a time-sorted slice.
///
/// Ties go to the earlier sample; among equal timestamps the first one in
/// the slice wins. Returns `None` only for an empty slice.
pub fn nearest_index(samples: &[PositionSample], t: Timestamp) -> Option<usize> {
    if samples.is_empty() {
        None
    } else {
        Some(nearest_in(samples, t))
    }
}

/// `nearest_index` for a slice known to be non-empty
fn nearest_in(samples: &[PositionSample], t: Timestamp) -> usize {
    // First sample with timestamp >= t
    let idx = samples.partition_point(|s| s.timestamp < t);

    if idx == 0 {
        return 0;
    }
    if idx == samples.len() {
        // Walk back to the first of any run of equal final timestamps
        let last = samples[idx - 1].timestamp;
        return samples.partition_point(|s| s.timestamp < last);
    }

    let before = idx - 1;
    let before_gap = t.abs_diff(samples[before].timestamp);
    let after_gap = t.abs_diff(samples[idx].timestamp);

    if after_gap < before_gap {
        idx
    } else {
        let earlier = samples[before].timestamp;
        samples.partition_point(|s| s.timestamp < earlier)
    }
}

/// Match every entry to its nearest position sample, in entry order
pub fn match_entries<'a>(
    entries: &'a [LogEntry],
    track: &'a PositionTrack,
) -> Result<Vec<MatchedRecord<'a>>> {
    let samples = track.samples();
    if samples.is_empty() {
        return Err(GeoFuseError::EmptyPositionSequence);
    }

    let matches: Vec<MatchedRecord<'a>> = entries
        .iter()
        .map(|entry| {
            let sample = &samples[nearest_in(samples, entry.timestamp)];
            MatchedRecord {
                entry,
                sample,
                time_delta: entry.timestamp.delta_nanos(sample.timestamp),
            }
        })
        .collect();

    debug!(
        "Matched {} log entries against {} position samples",
        matches.len(),
        samples.len()
    );

    Ok(matches)
}

/// Summary of how far matched positions are from their entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Number of matches
    pub count: usize,
    /// Largest absolute gap in nanoseconds
    pub max_gap_nanos: u64,
    /// Mean absolute gap in nanoseconds
    pub mean_gap_nanos: u64,
    /// Matches whose gap exceeds the staleness threshold
    pub stale: usize,
}

impl MatchStats {
    /// Compute statistics, counting gaps above `threshold_nanos` as stale
    pub fn compute(matches: &[MatchedRecord<'_>], threshold_nanos: Option<u64>) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let total: u128 = matches.iter().map(|m| m.gap_nanos() as u128).sum();
        Self {
            count: matches.len(),
            max_gap_nanos: matches.iter().map(|m| m.gap_nanos()).max().unwrap_or(0),
            mean_gap_nanos: (total / matches.len() as u128) as u64,
            stale: threshold_nanos
                .map(|limit| matches.iter().filter(|m| m.gap_nanos() > limit).count())
                .unwrap_or(0),
        }
    }
}
