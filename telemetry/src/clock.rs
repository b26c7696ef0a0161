use chrono::NaiveDateTime;

use crate::{parse_timestamp, Result};

/// Maps playback positions in a video to absolute time, given when the recording started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoClock {
    start: NaiveDateTime,
}

impl VideoClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }

    /// Parses the start time as `YYYY-MM-DDTHH:MM:SS[Z]`.
    pub fn parse(start: &str) -> Result<Self> {
        Ok(Self::new(parse_timestamp(start)?))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn time_at(&self, offset_ns: u64) -> NaiveDateTime {
        // i64 nanoseconds covers nearly three centuries of video
        let offset = i64::try_from(offset_ns).unwrap_or(i64::MAX);
        self.start + chrono::Duration::nanoseconds(offset)
    }
}

/// Fractional seconds from `t1` to `t2`, negative if `t2` is earlier.
pub(crate) fn seconds_between(t1: NaiveDateTime, t2: NaiveDateTime) -> f64 {
    let delta = t2 - t1;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
