//! `.pos` solution file parser
//!
//! Layout (RTKLIB `rnx2rtkp`/`rtkpost` output):
//!
//! ```text
//! % program   : RTKPOST ver.2.4.3
//! %  GPST                  latitude(deg) longitude(deg)  height(m)   Q  ns ...
//! 2019/03/07 09:11:26.200   1.299736170  103.787776372    20.0770   2   9 ...
//! ```
//!
//! Fields are split on whitespace and commas. The timestamp is either the
//! two-token calendar form above or a single token (RFC 3339 or a bare
//! number). Any bad data line fails the whole file.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{PositionSample, PositionTrack, TimeSystem};
use crate::error::{GeoFuseError, InputSource, Result};
use crate::time::{TimeUnit, Timestamp};

/// Settings for reading a position track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosLoadOptions {
    /// Unit of single-token numeric timestamps
    pub time_unit: TimeUnit,

    /// GPST minus UTC in seconds, subtracted from GPST tracks (18 since 2017)
    pub gps_utc_offset_s: f64,

    /// Fail on out-of-order samples instead of sorting them
    pub require_sorted: bool,
}

impl Default for PosLoadOptions {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Nanoseconds,
            gps_utc_offset_s: 0.0,
            require_sorted: false,
        }
    }
}

pub(super) fn parse(
    content: &str,
    source: &InputSource,
    options: &PosLoadOptions,
) -> Result<PositionTrack> {
    if !options.gps_utc_offset_s.is_finite() {
        return Err(GeoFuseError::Config(format!(
            "gps_utc_offset_s must be finite, got {}",
            options.gps_utc_offset_s
        )));
    }
    let gps_shift = -(options.gps_utc_offset_s * 1e9).round() as i64;

    let mut time_system = TimeSystem::Gpst;
    let mut samples: Vec<PositionSample> = Vec::new();
    let mut sorted = true;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('%') {
            if let Some(system) = header_time_system(comment) {
                time_system = system;
            }
            continue;
        }

        let mut sample = parse_line(line, line_no, source, options.time_unit)?;
        if time_system == TimeSystem::Gpst {
            sample.timestamp = sample.timestamp.offset_nanos(gps_shift);
        }

        if let Some(prev) = samples.last() {
            if sample.timestamp < prev.timestamp {
                if options.require_sorted {
                    return Err(GeoFuseError::UnsortedInput {
                        input: source.clone(),
                        line: line_no,
                    });
                }
                sorted = false;
            }
        }
        samples.push(sample);
    }

    if !sorted {
        warn!("{}: samples out of time order, sorting", source);
    }

    let mut track = PositionTrack::from_samples(samples);
    track.time_system = time_system;

    debug!(
        "Loaded {} position samples ({:?}) from {}",
        track.len(),
        time_system,
        source
    );

    Ok(track)
}

/// Column header lines name the time system as their first word
fn header_time_system(comment: &str) -> Option<TimeSystem> {
    match comment.split_whitespace().next()? {
        "GPST" => Some(TimeSystem::Gpst),
        "UTC" => Some(TimeSystem::Utc),
        _ => None,
    }
}

fn parse_line(
    line: &str,
    line_no: usize,
    source: &InputSource,
    unit: TimeUnit,
) -> Result<PositionSample> {
    let fields: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
        .collect();
    let bad = |message: String| GeoFuseError::malformed(source, Some(line_no), message);

    // Calendar timestamps span two fields: date and time-of-day
    let (time_text, rest) = if fields.len() >= 2 && fields[1].contains(':') {
        (format!("{} {}", fields[0], fields[1]), &fields[2..])
    } else if let Some((first, rest)) = fields.split_first() {
        (first.to_string(), rest)
    } else {
        return Err(bad("empty record".to_string()));
    };

    if rest.len() < 2 {
        return Err(bad(format!(
            "expected timestamp, latitude and longitude, found {} field(s)",
            fields.len()
        )));
    }

    let timestamp = Timestamp::parse_str(&time_text, unit)
        .ok_or_else(|| bad(format!("invalid timestamp '{}'", time_text)))?;
    let latitude = parse_coordinate(rest[0], "latitude", 90.0).map_err(&bad)?;
    let longitude = parse_coordinate(rest[1], "longitude", 180.0).map_err(&bad)?;

    let altitude = match rest.get(2) {
        Some(text) => Some(
            text.parse::<f64>()
                .ok()
                .filter(|h| h.is_finite())
                .ok_or_else(|| bad(format!("invalid height '{}'", text)))?,
        ),
        None => None,
    };

    Ok(PositionSample {
        timestamp,
        latitude,
        longitude,
        altitude,
        quality: parse_optional(rest.get(3), "quality").map_err(&bad)?,
        satellites: parse_optional(rest.get(4), "satellite count").map_err(&bad)?,
        line: line_no,
    })
}

fn parse_optional<T: std::str::FromStr>(
    text: Option<&&str>,
    name: &str,
) -> std::result::Result<Option<T>, String> {
    text.map(|t| t.parse().map_err(|_| format!("invalid {} '{}'", name, t)))
        .transpose()
}

fn parse_coordinate(text: &str, name: &str, limit: f64) -> std::result::Result<f64, String> {
    let value: f64 = text
        .parse()
        .map_err(|_| format!("invalid {} '{}'", name, text))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(format!("{} {} outside [-{}, {}]", name, value, limit, limit));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RTKLIB_SAMPLE: &str = "\
% program   : RTKPOST ver.2.4.3 b33
% pos mode  : kinematic
%
% (lat/lon/height=WGS84/ellipsoidal,Q=1:fix,2:float,3:sbas,4:dgps,5:single,6:ppp,ns=# of satellites)
%  GPST                  latitude(deg) longitude(deg)  height(m)   Q  ns   sdn(m)   sde(m)   sdu(m)  sdne(m)  sdeu(m)  sdun(m) age(s)  ratio
2019/03/07 09:11:26.200    1.299736170  103.787776372    20.0770   2   9   0.0218   0.0193   0.0522  -0.0068   0.0112  -0.0137   0.20    2.1
2019/03/07 09:11:26.400    1.299736201  103.787776390    20.0741   1  10   0.0036   0.0031   0.0089  -0.0011   0.0018  -0.0022   0.40   12.7
";

    fn parse_inline(content: &str) -> Result<PositionTrack> {
        parse(content, &InputSource::Inline, &PosLoadOptions::default())
    }

    #[test]
    fn test_rtklib_solution() {
        let track = parse_inline(RTKLIB_SAMPLE).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.time_system, TimeSystem::Gpst);

        let first = &track.samples()[0];
        assert_eq!(first.latitude, 1.299736170);
        assert_eq!(first.longitude, 103.787776372);
        assert_eq!(first.altitude, Some(20.0770));
        assert_eq!(first.quality, Some(2));
        assert_eq!(first.satellites, Some(9));
        assert_eq!(first.line, 6);

        let dt = track.samples()[1].timestamp.delta_nanos(first.timestamp);
        assert_eq!(dt, 200_000_000);
    }

    #[test]
    fn test_gps_offset_only_applies_to_gpst() {
        let options = PosLoadOptions {
            gps_utc_offset_s: 18.0,
            ..Default::default()
        };
        let gpst = parse(
            "%  GPST lat lon\n2024/01/01 00:00:18.000 1.0 2.0\n",
            &InputSource::Inline,
            &options,
        )
        .unwrap();
        let utc = parse(
            "%  UTC lat lon\n2024/01/01 00:00:18.000 1.0 2.0\n",
            &InputSource::Inline,
            &options,
        )
        .unwrap();

        let midnight = Timestamp::parse_str("2024-01-01T00:00:00Z", TimeUnit::Seconds).unwrap();
        assert_eq!(gpst.samples()[0].timestamp, midnight);
        assert_eq!(utc.samples()[0].timestamp, midnight.offset_nanos(18_000_000_000));
        assert_eq!(utc.time_system, TimeSystem::Utc);
    }

    #[test]
    fn test_comma_delimited_single_token_time() {
        let track = parse_inline("9,1.0,1.0\n21,2.0,2.0,15.5\n").unwrap();
        assert_eq!(track.samples()[0].timestamp, Timestamp::from_nanos(9));
        assert_eq!(track.samples()[1].altitude, Some(15.5));
        assert_eq!(track.samples()[1].quality, None);
    }

    #[test]
    fn test_wrong_field_count_fails_whole_file() {
        let err = parse_inline("10 1.0 1.0\n20 2.0\n30 3.0 3.0\n").unwrap_err();
        match err {
            GeoFuseError::MalformedInput { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert!(parse_inline("10 91.0 1.0\n").is_err());
        assert!(parse_inline("10 1.0 -180.5\n").is_err());
        assert!(parse_inline("10 NaN 1.0\n").is_err());
        assert!(parse_inline("10 1.0 1.0 high\n").is_err());
    }

    #[test]
    fn test_bad_quality_or_satellites_rejected() {
        let err = parse_inline("2019/03/07 09:11:26.200 1.0 2.0 20.0 X 9\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedInputError");
        assert!(err.to_string().contains("invalid quality 'X'"));

        let err = parse_inline("2019/03/07 09:11:26.200 1.0 2.0 20.0 1 nine\n").unwrap_err();
        assert!(err.to_string().contains("invalid satellite count 'nine'"));

        let err = parse_inline("10 1.0 2.0 20.0 300 9\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedInputError");
    }

    #[test]
    fn test_unsorted_is_sorted_by_default() {
        let track = parse_inline("40 3 3\n9 1 1\n21 2 2\n").unwrap();
        let times: Vec<i64> = track.samples().iter().map(|s| s.timestamp.as_nanos()).collect();
        assert_eq!(times, vec![9, 21, 40]);
    }

    #[test]
    fn test_unsorted_rejected_in_strict_mode() {
        let options = PosLoadOptions {
            require_sorted: true,
            ..Default::default()
        };
        let err = parse("9 1 1\n40 3 3\n21 2 2\n", &InputSource::Inline, &options).unwrap_err();
        match err {
            GeoFuseError::UnsortedInput { line, .. } => assert_eq!(line, 3),
            other => panic!("Expected UnsortedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_is_empty_track() {
        let track = parse_inline("% program : RTKPOST\n%  GPST latitude(deg)\n\n").unwrap();
        assert!(track.is_empty());
    }
}
