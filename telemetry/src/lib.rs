//! Interpolates recorded GPS/fitness telemetry at video playback times.
//!
//! The engine walks a time-ordered trackpoint sequence exactly once, keeping only the two
//! trackpoints that bracket the current playback time, and produces per-frame metrics with
//! correct running totals.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod clock;
mod distance;
mod engine;
mod error;
pub mod records;
mod span;
mod totals;
mod trackpoint;

pub use self::clock::VideoClock;
pub use self::distance::{DistanceStrategy, Format};
pub use self::engine::{Engine, Metrics, QueryResult};
pub use self::error::TelemetryError;
pub use self::span::{Span, SpanCursor};
pub use self::totals::Totals;
pub use self::trackpoint::{parse_timestamp, Trackpoint, TrackpointSequence};

pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;
