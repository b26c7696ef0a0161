use chrono::NaiveDateTime;
use geom::{Distance, Duration, Speed};

use crate::clock::seconds_between;
use crate::{
    DistanceStrategy, Format, Result, SpanCursor, Totals, Trackpoint, TrackpointSequence,
    VideoClock,
};

/// Interpolates telemetry at a series of playback times. Each query must be for a time no earlier
/// than the previous one; the engine trusts callers on this and never looks back. Results for
/// queries going backwards in time are meaningless.
pub struct Engine<I> {
    cursor: SpanCursor<I>,
    totals: Totals,
    format: Format,
    clock: VideoClock,
    data_start_time: NaiveDateTime,
}

/// Telemetry at one moment. Everything besides `time` and the passthrough fields is only known
/// while the time is covered by the trackpoints.
#[derive(Clone)]
pub struct QueryResult {
    pub time: NaiveDateTime,
    pub input_format: Format,
    /// When the first trackpoint was logged
    pub data_start_time: NaiveDateTime,
    /// Elevation gained and lost over all spans finished so far. Never interpolated.
    pub climb: f64,
    pub descent: f64,
    /// None before the trackpoints start and after they run out
    pub metrics: Option<Metrics>,
}

#[derive(Clone)]
pub struct Metrics {
    /// Meters, interpolated
    pub elevation: f64,
    /// Interpolated
    pub distance_traveled: Distance,
    /// The average over the current span
    pub speed: Speed,
    pub grade: f64,
    /// Exactly as recorded by the start of the current span
    pub cadence: Option<f64>,
    pub span_duration: Duration,
    pub elevation_delta: f64,
}

impl QueryResult {
    pub fn data_available(&self) -> bool {
        self.metrics.is_some()
    }
}

impl<I: Iterator<Item = Trackpoint>> Engine<I> {
    /// Reads the first two trackpoints immediately.
    pub fn new<T: IntoIterator<IntoIter = I>>(
        format: Format,
        points: T,
        clock: VideoClock,
    ) -> Result<Self> {
        Self::with_strategy(format, format.distance_strategy(), points, clock)
    }

    /// Like `new`, but measuring distance some way other than the format's default.
    pub fn with_strategy<T: IntoIterator<IntoIter = I>>(
        format: Format,
        strategy: DistanceStrategy,
        points: T,
        clock: VideoClock,
    ) -> Result<Self> {
        let cursor = SpanCursor::new(TrackpointSequence::new(points), strategy)?;
        let data_start_time = cursor.prev().time;
        Ok(Self {
            cursor,
            totals: Totals::new(),
            format,
            clock,
            data_start_time,
        })
    }

    /// `offset_ns` is nanoseconds since the start of the video.
    pub fn query_video_offset(&mut self, offset_ns: u64) -> Result<QueryResult> {
        let time = self.clock.time_at(offset_ns);
        self.query(time)
    }

    /// Errors are only for malformed input, and they're final; afterwards every query reports no
    /// data.
    pub fn query(&mut self, time: NaiveDateTime) -> Result<QueryResult> {
        let mut result = QueryResult {
            time,
            input_format: self.format,
            data_start_time: self.data_start_time,
            climb: self.totals.climb,
            descent: self.totals.descent,
            metrics: None,
        };

        if self.cursor.is_finished() || time < self.cursor.prev().time {
            return Ok(result);
        }
        if !self.cursor.seek(time, &mut self.totals)? {
            result.climb = self.totals.climb;
            result.descent = self.totals.descent;
            return Ok(result);
        }

        let prev = self.cursor.prev();
        let span = self.cursor.span();
        // Seeking never stops on a span with zero duration
        let fraction = seconds_between(prev.time, time) / span.duration.inner_seconds();

        result.climb = self.totals.climb;
        result.descent = self.totals.descent;
        result.metrics = Some(Metrics {
            elevation: prev.elevation + fraction * span.elevation_delta,
            distance_traveled: self.totals.prior_distance + span.distance * fraction,
            speed: span.average_speed,
            grade: span.grade,
            cadence: prev.cadence,
            span_duration: span.duration,
            elevation_delta: span.elevation_delta,
        });
        Ok(result)
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn clock(&self) -> &VideoClock {
        &self.clock
    }

    pub fn data_start_time(&self) -> NaiveDateTime {
        self.data_start_time
    }

    /// True once the trackpoints have run out. Every later query reports no data.
    pub fn is_finished(&self) -> bool {
        self.cursor.is_finished()
    }
}
