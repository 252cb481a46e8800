//! Centroid of matched positions
//!
//! Plain arithmetic mean of latitudes and longitudes. Tracks crossing the
//! antimeridian must be normalised by the caller first.

use serde::{Deserialize, Serialize};

use crate::error::{GeoFuseError, Result};

/// Mean position of a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    /// Mean latitude in degrees
    pub latitude: f64,
    /// Mean longitude in degrees
    pub longitude: f64,
}

impl Centroid {
    /// Mean of `(latitude, longitude)` pairs
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (count, lat_sum, lon_sum) = points
            .into_iter()
            .fold((0usize, 0.0f64, 0.0f64), |(n, lat, lon), (p_lat, p_lon)| {
                (n + 1, lat + p_lat, lon + p_lon)
            });

        if count == 0 {
            return Err(GeoFuseError::EmptyInput);
        }

        Ok(Self {
            latitude: lat_sum / count as f64,
            longitude: lon_sum / count as f64,
        })
    }
}
