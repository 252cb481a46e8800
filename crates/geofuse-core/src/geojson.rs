//! GeoJSON output
//!
//! Builds the FeatureCollection written for a fused log: one Point feature per
//! matched entry, in entry order, then a single centroid feature. Log
//! metadata and the centroid are also carried as foreign members of the
//! collection object.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::centroid::Centroid;
use crate::error::{GeoFuseError, Result};
use crate::matcher::MatchedRecord;

/// Collection members that metadata may not overwrite
const RESERVED_MEMBERS: &[&str] = &["type", "features", "centroid"];

/// Property flag marking the centroid feature
pub const CENTROID_PROPERTY: &str = "centroid";

/// GeoJSON `type` tag of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionType {
    /// The only collection type emitted
    FeatureCollection,
}

/// GeoJSON `type` tag of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    /// A geometry with properties
    Feature,
}

/// GeoJSON `type` tag of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    /// A single position
    Point,
}

/// A Point geometry. Coordinates are `[longitude, latitude(, altitude)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Always `Point`
    #[serde(rename = "type")]
    pub kind: GeometryType,
    /// `[longitude, latitude]` or `[longitude, latitude, altitude]`
    pub coordinates: Vec<f64>,
}

impl Point {
    /// Build from internal latitude/longitude order, swapping to GeoJSON order
    pub fn from_lat_lon(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        let mut coordinates = vec![longitude, latitude];
        coordinates.extend(altitude);
        Self {
            kind: GeometryType::Point,
            coordinates,
        }
    }

    /// Latitude and longitude, swapped back from GeoJSON order
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        match self.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lat, *lon)),
            _ => None,
        }
    }

    /// Third coordinate, when present
    pub fn altitude(&self) -> Option<f64> {
        self.coordinates.get(2).copied()
    }
}

/// A GeoJSON feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `Feature`
    #[serde(rename = "type")]
    pub kind: FeatureType,
    /// Where the feature is
    pub geometry: Point,
    /// Log payload plus computed match fields
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Whether this is the centroid feature
    pub fn is_centroid(&self) -> bool {
        self.properties.get(CENTROID_PROPERTY) == Some(&Value::Bool(true))
    }
}

/// Centroid foreign member, `{"lat": .., "lon": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentroidMember {
    /// Mean latitude
    pub lat: f64,
    /// Mean longitude
    pub lon: f64,
}

/// The output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `FeatureCollection`
    #[serde(rename = "type")]
    pub kind: CollectionType,

    /// Log metadata copied to the top level
    #[serde(flatten)]
    pub metadata: Map<String, Value>,

    /// Mean of the matched positions
    pub centroid: CentroidMember,

    /// Point features in log order, centroid last
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of per-entry point features (excludes the centroid)
    pub fn point_count(&self) -> usize {
        self.features.iter().filter(|f| !f.is_centroid()).count()
    }

    /// The centroid feature
    pub fn centroid_feature(&self) -> Option<&Feature> {
        self.features.iter().find(|f| f.is_centroid())
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Indent the document
    pub pretty: bool,

    /// Spaces per indent level when pretty
    pub indent: usize,

    /// Copy log metadata into the collection object
    pub include_metadata: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: 4,
            include_metadata: true,
        }
    }
}

/// Assemble the feature collection for a set of matches
pub fn build_collection(
    metadata: &Map<String, Value>,
    matches: &[MatchedRecord<'_>],
    options: &OutputOptions,
) -> Result<FeatureCollection> {
    for m in matches {
        let s = m.sample;
        if !s.latitude.is_finite()
            || !s.longitude.is_finite()
            || s.altitude.is_some_and(|h| !h.is_finite())
        {
            return Err(GeoFuseError::Serialization(format!(
                "non-finite coordinates for log record {}",
                m.entry.index
            )));
        }
    }

    let centroid =
        Centroid::from_points(matches.iter().map(|m| (m.sample.latitude, m.sample.longitude)))?;

    let mut features: Vec<Feature> = matches.iter().map(point_feature).collect();
    features.push(centroid_feature(&centroid));

    let metadata = if options.include_metadata {
        metadata
            .iter()
            .filter(|(k, _)| !RESERVED_MEMBERS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    } else {
        Map::new()
    };

    Ok(FeatureCollection {
        kind: CollectionType::FeatureCollection,
        metadata,
        centroid: CentroidMember {
            lat: centroid.latitude,
            lon: centroid.longitude,
        },
        features,
    })
}

fn point_feature(m: &MatchedRecord<'_>) -> Feature {
    let mut properties = m.entry.payload.clone();
    properties.insert("timestamp".into(), m.entry.timestamp.as_nanos().into());
    properties.insert("time_delta".into(), m.time_delta.into());
    properties.insert(
        "position_timestamp".into(),
        m.sample.timestamp.as_nanos().into(),
    );
    if let Some(q) = m.sample.quality {
        properties.insert("quality".into(), q.into());
    }
    if let Some(ns) = m.sample.satellites {
        properties.insert("satellites".into(), ns.into());
    }

    Feature {
        kind: FeatureType::Feature,
        geometry: Point::from_lat_lon(m.sample.latitude, m.sample.longitude, m.sample.altitude),
        properties,
    }
}

fn centroid_feature(centroid: &Centroid) -> Feature {
    let mut properties = Map::new();
    properties.insert(CENTROID_PROPERTY.into(), Value::Bool(true));
    Feature {
        kind: FeatureType::Feature,
        geometry: Point::from_lat_lon(centroid.latitude, centroid.longitude, None),
        properties,
    }
}

/// Serialize a collection to a writer
pub fn write_collection<W: Write>(
    writer: W,
    collection: &FeatureCollection,
    options: &OutputOptions,
) -> Result<()> {
    let result = if options.pretty {
        let indent = vec![b' '; options.indent];
        let mut ser =
            serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(&indent));
        collection.serialize(&mut ser)
    } else {
        let mut ser = serde_json::Serializer::new(writer);
        collection.serialize(&mut ser)
    };
    result.map_err(|e| GeoFuseError::Serialization(e.to_string()))
}

/// Serialize a collection to a string
pub fn to_string(collection: &FeatureCollection, options: &OutputOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_collection(&mut buf, collection, options)?;
    String::from_utf8(buf).map_err(|e| GeoFuseError::Serialization(e.to_string()))
}
