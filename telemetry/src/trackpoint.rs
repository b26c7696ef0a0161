use chrono::NaiveDateTime;
use geom::Distance;

use crate::{Result, TelemetryError};

/// YYYY-MM-DDTHH:MM:SS, always UTC
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One recorded sample. Which of the optional fields are present depends on the file format the
/// trackpoints came from.
#[derive(Clone)]
pub struct Trackpoint {
    pub time: NaiveDateTime,
    /// Meters
    pub elevation: f64,
    /// Degrees
    pub lat_lon: Option<(f64, f64)>,
    /// Distance traveled since the start of the recording, as measured by the device
    pub cumulative_distance: Option<Distance>,
    pub cadence: Option<f64>,
}

impl Trackpoint {
    pub fn new(time: NaiveDateTime, elevation: f64) -> Self {
        Self {
            time,
            elevation,
            lat_lon: None,
            cumulative_distance: None,
            cadence: None,
        }
    }

    pub fn with_lat_lon(mut self, lat: f64, lon: f64) -> Self {
        self.lat_lon = Some((lat, lon));
        self
    }

    pub fn with_cumulative_distance(mut self, dist: Distance) -> Self {
        self.cumulative_distance = Some(dist);
        self
    }

    pub fn with_cadence(mut self, cadence: f64) -> Self {
        self.cadence = Some(cadence);
        self
    }
}

/// Parses `YYYY-MM-DDTHH:MM:SS`, with or without a trailing `Z`.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| TelemetryError::BadTimestamp(raw.to_string()))
}

/// A single forward pass over trackpoints. There's no way to look back or restart; each pull
/// hands over ownership of the next trackpoint.
pub struct TrackpointSequence<I> {
    inner: I,
    pulled: usize,
    last_time: Option<NaiveDateTime>,
}

impl<I: Iterator<Item = Trackpoint>> TrackpointSequence<I> {
    pub fn new<T: IntoIterator<IntoIter = I>>(points: T) -> Self {
        Self {
            inner: points.into_iter(),
            pulled: 0,
            last_time: None,
        }
    }

    /// `Ok(None)` once the input is exhausted. Fails if time goes backwards.
    pub fn pull(&mut self) -> Result<Option<Trackpoint>> {
        let pt = match self.inner.next() {
            Some(pt) => pt,
            None => return Ok(None),
        };
        if let Some(prev) = self.last_time {
            if pt.time < prev {
                return Err(TelemetryError::OutOfOrder {
                    index: self.pulled,
                    prev,
                    next: pt.time,
                });
            }
        }
        self.last_time = Some(pt.time);
        self.pulled += 1;
        Ok(Some(pt))
    }

    /// How many trackpoints have been handed out so far. The most recently pulled one has index
    /// `pulled() - 1`.
    pub fn pulled(&self) -> usize {
        self.pulled
    }
}
