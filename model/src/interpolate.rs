use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use crate::{ModelError, Position, Result, Waypoint};

/// Linearly interpolates between two waypoints, yielding `steps + 1` positions including both
/// endpoints. This is planar, not along a great circle.
pub fn interpolate(start: &Waypoint, end: &Waypoint, steps: usize) -> Result<Interpolation> {
    let steps = NonZeroUsize::new(steps).ok_or_else(|| {
        ModelError::InvalidArgument("can't interpolate a segment in 0 steps".to_string())
    })?;
    Interpolation::new(start.position(), end.position(), steps)
}

/// The position at step `i` of `steps` from `start` to `end`. None past the end.
pub(crate) fn point_at(
    start: Position,
    end: Position,
    steps: usize,
    i: usize,
) -> Option<Position> {
    if i > steps {
        return None;
    }
    // The last step lands exactly on the endpoint, without rounding error
    if i == steps {
        return Some(end);
    }
    let pct = i as f64 / steps as f64;
    Some(Position {
        lat: start.lat + (end.lat - start.lat) * pct,
        lng: start.lng + (end.lng - start.lng) * pct,
    })
}

/// A lazy sequence of positions along one segment. Nothing is allocated; any step can be looked
/// up directly.
#[derive(Clone, Debug)]
pub struct Interpolation {
    start: Position,
    end: Position,
    steps: usize,
    // Remaining range for iteration, [front, back)
    front: usize,
    back: usize,
}

impl Interpolation {
    pub fn new(start: Position, end: Position, steps: NonZeroUsize) -> Result<Self> {
        let steps = steps.get();
        let back = steps.checked_add(1).ok_or_else(|| {
            ModelError::InvalidArgument(format!("{steps} steps is too many to count"))
        })?;
        Ok(Self {
            start,
            end,
            steps,
            front: 0,
            back,
        })
    }

    /// The position at step `i`, regardless of how far iteration has gone. None past the end.
    pub fn get(&self, i: usize) -> Option<Position> {
        point_at(self.start, self.end, self.steps, i)
    }
}

impl Iterator for Interpolation {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.front >= self.back {
            return None;
        }
        let pos = self.get(self.front);
        self.front += 1;
        pos
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Position> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Interpolation {
    fn next_back(&mut self) -> Option<Position> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.get(self.back)
    }
}

impl ExactSizeIterator for Interpolation {}

impl FusedIterator for Interpolation {}
