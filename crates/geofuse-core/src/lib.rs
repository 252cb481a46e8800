//! # GeoFuse Core Library
//!
//! Geotags timestamped log records against a GNSS position track.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - JSON timestamp log loading (camera frame logs and plain record arrays)
//! - RTKLIB `.pos` solution file parsing
//! - Nearest-timestamp matching of log entries to position fixes
//! - Centroid computation over the matched positions
//! - GeoJSON FeatureCollection output
//!
//! ## Example
//!
//! ```rust,ignore
//! use geofuse_core::prelude::*;
//!
//! let config = FusionConfig::default();
//! let output = pipeline::fuse_files("frames.json", "track.pos", &config)?;
//! pipeline::write_output("frames.geojson", &output.collection, &config.output)?;
//! ```

pub mod centroid;
pub mod config;
pub mod error;
pub mod geojson;
pub mod matcher;
pub mod pipeline;
pub mod position;
pub mod time;
pub mod timelog;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::centroid::Centroid;
    pub use crate::config::FusionConfig;
    pub use crate::error::{GeoFuseError, InputSource};
    pub use crate::geojson::{Feature, FeatureCollection, OutputOptions, Point};
    pub use crate::matcher::{match_entries, MatchStats, MatchedRecord};
    pub use crate::pipeline::{self, FusionOutput};
    pub use crate::position::{PosLoadOptions, PositionSample, PositionTrack, TimeSystem};
    pub use crate::time::{TimeUnit, Timestamp};
    pub use crate::timelog::{LogEntry, LogLoadOptions, TimestampLog};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
