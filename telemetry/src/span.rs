use chrono::NaiveDateTime;
use geom::{Distance, Duration, Speed};

use crate::clock::seconds_between;
use crate::{DistanceStrategy, Result, TelemetryError, Totals, Trackpoint, TrackpointSequence};

/// Quantities describing the interval between two adjacent trackpoints. These're calculated once
/// when the cursor reaches the span, not per query.
#[derive(Clone, Copy)]
pub struct Span {
    pub distance: Distance,
    pub duration: Duration,
    /// Meters; positive means climbing
    pub elevation_delta: f64,
    pub average_speed: Speed,
    /// Rise over horizontal run
    pub grade: f64,
}

impl Span {
    pub fn new(distance: Distance, duration: Duration, elevation_delta: f64) -> Self {
        let average_speed = if duration == Duration::ZERO {
            Speed::ZERO
        } else {
            Speed::from_dist_time(distance, duration)
        };
        Self {
            distance,
            duration,
            elevation_delta,
            average_speed,
            grade: grade(distance, elevation_delta),
        }
    }

    /// Trackpoints logged at the same moment aren't measured at all, so missing fields on them
    /// don't matter.
    fn between(
        prev: &Trackpoint,
        next: &Trackpoint,
        strategy: DistanceStrategy,
        prev_index: usize,
    ) -> Result<Self> {
        if prev.time == next.time {
            return Ok(Self::new(Distance::ZERO, Duration::ZERO, 0.0));
        }
        let distance = strategy.between(prev, next, prev_index)?;
        let duration = Duration::seconds(seconds_between(prev.time, next.time));
        Ok(Self::new(distance, duration, next.elevation - prev.elevation))
    }
}

/// The distance covered is the hypotenuse of the slope and the elevation change is the vertical
/// leg, so recover the horizontal run. The absolute value handles noisy data where the elevation
/// change exceeds the distance covered.
fn grade(distance: Distance, elevation_delta: f64) -> f64 {
    let hypotenuse = distance.inner_meters();
    if hypotenuse == 0.0 {
        return 0.0;
    }
    let run = (hypotenuse.powi(2) - elevation_delta.powi(2)).abs().sqrt();
    // Purely vertical movement has no meaningful grade
    if run == 0.0 {
        return 0.0;
    }
    elevation_delta.abs() / run * elevation_delta.signum()
}

/// Walks forward through a trackpoint sequence, holding only the pair of trackpoints that bracket
/// the current time.
pub struct SpanCursor<I> {
    points: TrackpointSequence<I>,
    strategy: DistanceStrategy,
    prev: Trackpoint,
    next: Trackpoint,
    span: Span,
    finished: bool,
}

impl<I: Iterator<Item = Trackpoint>> SpanCursor<I> {
    pub fn new(mut points: TrackpointSequence<I>, strategy: DistanceStrategy) -> Result<Self> {
        let prev = points.pull()?.ok_or(TelemetryError::InsufficientData)?;
        let next = points.pull()?.ok_or(TelemetryError::InsufficientData)?;
        let span = Span::between(&prev, &next, strategy, 0)?;
        Ok(Self {
            points,
            strategy,
            prev,
            next,
            span,
            finished: false,
        })
    }

    pub fn prev(&self) -> &Trackpoint {
        &self.prev
    }

    pub fn next(&self) -> &Trackpoint {
        &self.next
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Once true, the trackpoints have run out and the cursor never moves again.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Both trackpoints were logged at the same moment, or too close together for the duration to
    /// register. Nothing happens during these spans.
    pub fn is_degenerate(&self) -> bool {
        self.span.duration == Duration::ZERO
    }

    /// Advances until `time` falls within the current span and the span isn't degenerate. Returns
    /// false if the trackpoints run out first.
    pub fn seek(&mut self, time: NaiveDateTime, totals: &mut Totals) -> Result<bool> {
        while !self.finished && (self.is_degenerate() || time > self.next.time) {
            self.advance(totals)?;
        }
        Ok(!self.finished)
    }

    /// Leaves the current span behind, committing it to the totals first, and moves to the next
    /// pair of trackpoints. Any error is fatal and finishes the cursor.
    pub fn advance(&mut self, totals: &mut Totals) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let result = self.step(totals);
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    fn step(&mut self, totals: &mut Totals) -> Result<()> {
        if self.is_degenerate() {
            debug!(
                "Skipping zero-length span from {} to {}",
                self.prev.time, self.next.time
            );
        } else {
            debug!(
                "Leaving span {} to {}: {}m, {}m elevation",
                self.prev.time,
                self.next.time,
                self.span.distance.inner_meters(),
                self.span.elevation_delta
            );
            totals.commit(&self.span);
        }

        let pt = match self.points.pull()? {
            Some(pt) => pt,
            None => {
                info!(
                    "Trackpoints exhausted after {} points, at {}",
                    self.points.pulled(),
                    self.next.time
                );
                self.finished = true;
                return Ok(());
            }
        };
        self.prev = std::mem::replace(&mut self.next, pt);
        self.span = Span::between(
            &self.prev,
            &self.next,
            self.strategy,
            self.points.pulled() - 2,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::parse_timestamp;

    fn at(secs: i64) -> NaiveDateTime {
        parse_timestamp("2012-06-02T10:00:00").unwrap() + chrono::Duration::seconds(secs)
    }

    fn cursor(points: Vec<(i64, f64, f64)>) -> SpanCursor<std::vec::IntoIter<Trackpoint>> {
        let points: Vec<Trackpoint> = points
            .into_iter()
            .map(|(secs, elevation, dist)| {
                Trackpoint::new(at(secs), elevation)
                    .with_cumulative_distance(Distance::meters(dist))
            })
            .collect();
        SpanCursor::new(
            TrackpointSequence::new(points),
            DistanceStrategy::CumulativeField,
        )
        .unwrap()
    }

    #[test]
    fn grade_sign_follows_elevation() {
        let up = grade(Distance::meters(100.0), 5.0);
        let down = grade(Distance::meters(100.0), -5.0);
        assert!(up > 0.0);
        assert!(down < 0.0);
        assert_eq!(up, -down);
        // 5 / sqrt(100^2 - 5^2)
        assert!((up - 0.050063).abs() < 1e-6);
    }

    #[test]
    fn grade_edge_cases() {
        assert_eq!(grade(Distance::ZERO, 3.0), 0.0);
        assert_eq!(grade(Distance::meters(20.0), 0.0), 0.0);
        assert_eq!(grade(Distance::meters(5.0), 5.0), 0.0);
        // Elevation noise bigger than the distance covered still gives a finite, signed grade
        let noisy = grade(Distance::meters(3.0), -5.0);
        assert!(noisy.is_finite());
        assert!((noisy + 1.25).abs() < 1e-9);
    }

    #[test]
    fn span_quantities() {
        let span = Span::new(Distance::meters(100.0), Duration::seconds(60.0), 10.0);
        assert!((span.average_speed.inner_meters_per_second() - 1.6667).abs() < 1e-3);
        assert!(span.grade > 0.0);

        let stopped = Span::new(Distance::ZERO, Duration::ZERO, 0.0);
        assert_eq!(stopped.average_speed.inner_meters_per_second(), 0.0);
        assert_eq!(stopped.grade, 0.0);
    }

    #[test]
    fn needs_two_points() {
        let result = SpanCursor::new(
            TrackpointSequence::new(vec![Trackpoint::new(at(0), 1.0)]),
            DistanceStrategy::Geodesic,
        );
        assert_eq!(result.err(), Some(TelemetryError::InsufficientData));

        let result = SpanCursor::new(
            TrackpointSequence::new(Vec::<Trackpoint>::new()),
            DistanceStrategy::Geodesic,
        );
        assert_eq!(result.err(), Some(TelemetryError::InsufficientData));
    }

    #[test]
    fn commits_each_span_once() {
        let mut cursor = cursor(vec![(0, 10.0, 0.0), (10, 15.0, 50.0), (20, 12.0, 80.0)]);
        let mut totals = Totals::new();
        assert!(!cursor.is_degenerate());
        assert_eq!(cursor.span().elevation_delta, 5.0);

        cursor.advance(&mut totals).unwrap();
        assert_eq!(totals.climb, 5.0);
        assert_eq!(totals.prior_distance.inner_meters(), 50.0);
        assert_eq!(cursor.prev().time, at(10));
        assert_eq!(cursor.span().elevation_delta, -3.0);

        cursor.advance(&mut totals).unwrap();
        assert!(cursor.is_finished());
        assert_eq!(totals.descent, 3.0);
        assert_eq!(totals.prior_distance.inner_meters(), 80.0);

        // Nothing more to commit
        cursor.advance(&mut totals).unwrap();
        assert_eq!(totals.climb, 5.0);
        assert_eq!(totals.descent, 3.0);
        assert_eq!(totals.prior_distance.inner_meters(), 80.0);
    }

    #[test]
    fn degenerate_pairs_commit_nothing() {
        let mut cursor = cursor(vec![
            (0, 10.0, 0.0),
            (10, 20.0, 40.0),
            (10, 50.0, 45.0),
            (10, 60.0, 47.0),
            (20, 70.0, 90.0),
        ]);
        let mut totals = Totals::new();
        assert!(cursor.seek(at(15), &mut totals).unwrap());

        assert_eq!(cursor.prev().elevation, 60.0);
        assert_eq!(cursor.next().elevation, 70.0);
        // Only the first real span was committed
        assert_eq!(totals.climb, 10.0);
        assert_eq!(totals.prior_distance.inner_meters(), 40.0);
        assert_eq!(cursor.span().distance.inner_meters(), 43.0);
    }

    #[test]
    fn sub_resolution_span_is_degenerate() {
        let points = vec![
            Trackpoint::new(at(0), 10.0).with_cumulative_distance(Distance::ZERO),
            Trackpoint::new(at(0) + chrono::Duration::microseconds(20), 11.0)
                .with_cumulative_distance(Distance::meters(0.5)),
            Trackpoint::new(at(10), 15.0).with_cumulative_distance(Distance::meters(40.0)),
        ];
        let mut cursor = SpanCursor::new(
            TrackpointSequence::new(points),
            DistanceStrategy::CumulativeField,
        )
        .unwrap();
        assert_ne!(cursor.prev().time, cursor.next().time);
        assert!(cursor.is_degenerate());

        let mut totals = Totals::new();
        assert!(cursor.seek(at(0), &mut totals).unwrap());
        assert!(!cursor.is_degenerate());
        assert_eq!(cursor.prev().elevation, 11.0);
        assert_eq!(totals.climb, 0.0);
        assert!(cursor.span().duration.inner_seconds() > 9.0);
    }

    #[test]
    fn seek_runs_out() {
        let mut cursor = cursor(vec![(0, 10.0, 0.0), (10, 20.0, 40.0)]);
        let mut totals = Totals::new();
        assert!(cursor.seek(at(10), &mut totals).unwrap());
        assert!(!cursor.seek(at(11), &mut totals).unwrap());
        assert!(cursor.is_finished());
        assert_eq!(totals.climb, 10.0);
        assert!(!cursor.seek(at(12), &mut totals).unwrap());
        assert_eq!(totals.climb, 10.0);
    }

    #[test]
    fn malformed_point_finishes_cursor() {
        let points = vec![
            Trackpoint::new(at(0), 1.0).with_lat_lon(47.6, -122.3),
            Trackpoint::new(at(5), 1.0).with_lat_lon(47.601, -122.3),
            Trackpoint::new(at(10), 1.0),
        ];
        let mut cursor =
            SpanCursor::new(TrackpointSequence::new(points), DistanceStrategy::Geodesic).unwrap();
        let mut totals = Totals::new();
        assert_eq!(
            cursor.seek(at(7), &mut totals).err(),
            Some(TelemetryError::MalformedTrackpoint {
                index: 2,
                missing: "latitude/longitude",
            })
        );
        assert!(cursor.is_finished());
    }
}
