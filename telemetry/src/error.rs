use chrono::NaiveDateTime;
use thiserror::Error;

/// Fatal problems with the trackpoint input. Queries outside the recorded time range are not
/// errors; they're reported through `QueryResult::data_available`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    #[error("need at least 2 trackpoints")]
    InsufficientData,
    #[error("trackpoint {index} has no {missing}")]
    MalformedTrackpoint { index: usize, missing: &'static str },
    #[error("trackpoint {index} out-of-order: {prev} then {next}")]
    OutOfOrder {
        index: usize,
        prev: NaiveDateTime,
        next: NaiveDateTime,
    },
    #[error("can't parse timestamp {0:?}")]
    BadTimestamp(String),
}
