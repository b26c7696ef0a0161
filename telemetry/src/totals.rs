use geom::Distance;

use crate::Span;

/// Running totals over every span the cursor has left behind. Nothing here ever decreases, and a
/// span is only counted once.
#[derive(Clone, Copy)]
pub struct Totals {
    pub prior_distance: Distance,
    /// Meters
    pub climb: f64,
    /// Meters, positive
    pub descent: f64,
}

impl Totals {
    pub fn new() -> Self {
        Self {
            prior_distance: Distance::ZERO,
            climb: 0.0,
            descent: 0.0,
        }
    }

    pub fn commit(&mut self, span: &Span) {
        if span.elevation_delta > 0.0 {
            self.climb += span.elevation_delta;
        } else if span.elevation_delta < 0.0 {
            self.descent -= span.elevation_delta;
        }
        self.prior_distance += span.distance;
    }
}
