use std::fmt;
use std::str::FromStr;

use geom::{Distance, LonLat};
use serde::{Deserialize, Serialize};

use crate::{Result, TelemetryError, Trackpoint};

/// The input file format the trackpoints were parsed from. Each format records different data, so
/// this decides how distance is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Only positions; distance has to be calculated
    Gpx,
    /// The device records distance traveled directly
    Tcx,
}

impl Format {
    pub fn distance_strategy(self) -> DistanceStrategy {
        match self {
            Format::Gpx => DistanceStrategy::Geodesic,
            Format::Tcx => DistanceStrategy::CumulativeField,
        }
    }

    /// Guesses from a path like `ride.gpx` or `ride.tcx.csv`.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        let stem = lower.strip_suffix(".csv").unwrap_or(&lower);
        stem.rsplit('.').next()?.parse().ok()
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> anyhow::Result<Self> {
        match x.to_lowercase().as_str() {
            "gpx" => Ok(Format::Gpx),
            "tcx" => Ok(Format::Tcx),
            _ => bail!("Unknown format {x}; use gpx or tcx"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Format::Gpx => write!(f, "gpx"),
            Format::Tcx => write!(f, "tcx"),
        }
    }
}

/// How to measure the distance covered between two adjacent trackpoints. Fixed for the lifetime of
/// an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceStrategy {
    /// Difference of the recorded cumulative distances
    CumulativeField,
    /// Great-circle distance between the recorded positions. Elevation change is ignored.
    Geodesic,
}

impl DistanceStrategy {
    /// `prev_index` identifies `prev` in the input, for error messages; `next` is assumed to come
    /// right after.
    pub fn between(
        self,
        prev: &Trackpoint,
        next: &Trackpoint,
        prev_index: usize,
    ) -> Result<Distance> {
        match self {
            DistanceStrategy::CumulativeField => {
                let d1 = cumulative_distance(prev, prev_index)?;
                let d2 = cumulative_distance(next, prev_index + 1)?;
                Ok(d2 - d1)
            }
            DistanceStrategy::Geodesic => {
                let pt1 = lon_lat(prev, prev_index)?;
                let pt2 = lon_lat(next, prev_index + 1)?;
                Ok(pt1.gps_dist(pt2))
            }
        }
    }
}

fn cumulative_distance(pt: &Trackpoint, index: usize) -> Result<Distance> {
    pt.cumulative_distance.ok_or(TelemetryError::MalformedTrackpoint {
        index,
        missing: "cumulative distance",
    })
}

fn lon_lat(pt: &Trackpoint, index: usize) -> Result<LonLat> {
    match pt.lat_lon {
        Some((lat, lon)) => Ok(LonLat::new(lon, lat)),
        None => Err(TelemetryError::MalformedTrackpoint {
            index,
            missing: "latitude/longitude",
        }),
    }
}
