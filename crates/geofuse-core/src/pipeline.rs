//! One fusion run: load, match, summarise, build
//!
//! A run either produces a complete document or an error. Nothing is written
//! until the whole collection has been built and serialized.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::FusionConfig;
use crate::error::{GeoFuseError, Result};
use crate::geojson::{self, FeatureCollection, OutputOptions};
use crate::matcher::{self, MatchStats};
use crate::position::PositionTrack;
use crate::timelog::TimestampLog;

/// Result of a fusion run
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutput {
    /// The document to write
    pub collection: FeatureCollection,
    /// Time-gap statistics of the matches
    pub stats: MatchStats,
}

/// Fuse an already loaded log and track
pub fn fuse(
    log: &TimestampLog,
    track: &PositionTrack,
    config: &FusionConfig,
) -> Result<FusionOutput> {
    let matches = matcher::match_entries(&log.entries, track)?;

    let threshold = config.max_time_gap_nanos();
    let stats = MatchStats::compute(&matches, threshold);
    if let Some(limit) = threshold {
        for m in matches.iter().filter(|m| m.gap_nanos() > limit) {
            warn!(
                "Log record {} matched a position {:.3} s away",
                m.entry.index,
                m.time_delta as f64 / 1e9
            );
        }
    }

    let collection = geojson::build_collection(&log.metadata, &matches, &config.output)?;

    info!(
        "Fused {} log entries with {} position samples (max gap {:.3} s, {} stale)",
        stats.count,
        track.len(),
        stats.max_gap_nanos as f64 / 1e9,
        stats.stale
    );

    Ok(FusionOutput { collection, stats })
}

/// Load both inputs and fuse them
pub fn fuse_files(
    log_path: impl AsRef<Path>,
    pos_path: impl AsRef<Path>,
    config: &FusionConfig,
) -> Result<FusionOutput> {
    let track = PositionTrack::from_file(pos_path, &config.position)?;
    if track.is_empty() {
        return Err(GeoFuseError::EmptyPositionSequence);
    }
    let log = TimestampLog::from_file(log_path, &config.log)?;
    fuse(&log, &track, config)
}

/// Serialize a collection and write it to `path` in one step.
///
/// The document goes to a temporary file next to `path`, which is then
/// renamed over it; a failed write leaves any existing file untouched.
pub fn write_output(
    path: impl AsRef<Path>,
    collection: &FeatureCollection,
    options: &OutputOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut text = geojson::to_string(collection, options)?;
    text.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| GeoFuseError::io(path, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| GeoFuseError::io(path, e))?;
    tmp.persist(path).map_err(|e| GeoFuseError::io(path, e.error))?;
    Ok(())
}
