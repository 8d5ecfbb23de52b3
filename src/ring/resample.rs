//! Arc-length resampling of a ring.

use super::{Direction, PolygonRing};
use crate::error::RingError;
use crate::geometry::{Vec2, EPS};

impl PolygonRing {
    /// Rebuild the ring with nodes roughly `spacing` apart along the outline.
    ///
    /// The node count is the perimeter divided by `spacing`, rounded, and at
    /// least 3. See [`PolygonRing::resample_to_count`].
    pub fn resample(&mut self, spacing: f64, dir: Direction) -> Result<(), RingError> {
        let perimeter = self.perimeter();
        if !(spacing > 0.0) || perimeter <= EPS {
            return Err(RingError::Degenerate);
        }
        let count = ((perimeter / spacing).round() as usize).max(3);
        self.resample_to_count(count, dir)
    }

    /// Rebuild the ring with exactly `count` nodes evenly spaced by arc
    /// length, starting at the current head and walking `dir`.
    ///
    /// Nodes are placed by marching along each edge in fixed steps; the part
    /// of a step left over at the end of an edge carries into the next one.
    /// Zero-length edges are skipped. The rebuilt nodes get fresh track
    /// numbers and zero velocity; normals must be recomputed by the caller.
    pub fn resample_to_count(&mut self, count: usize, dir: Direction) -> Result<(), RingError> {
        if count < 3 {
            return Err(RingError::TooFewNodes(count));
        }
        let points = self.positions(dir);
        let samples = march(&points, count)?;
        let rebuilt = PolygonRing::with_first_track(&samples, self.next_track)?;
        *self = match dir {
            Direction::Forward => rebuilt,
            Direction::Backward => rebuilt.reversed_links(),
        };
        Ok(())
    }

    /// Same nodes, with `next` and `prev` links swapped.
    fn reversed_links(mut self) -> Self {
        for node in self.slots.iter_mut().flatten() {
            std::mem::swap(&mut node.next, &mut node.prev);
        }
        self
    }
}

fn march(points: &[Vec2], count: usize) -> Result<Vec<Vec2>, RingError> {
    let n = points.len();
    let perimeter: f64 = (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum();
    if perimeter <= EPS {
        return Err(RingError::Degenerate);
    }
    let step = perimeter / count as f64;

    let mut out = Vec::with_capacity(count);
    out.push(points[0]);
    // Arc length still to travel before the next sample.
    let mut to_next = step;
    for i in 0..n {
        if out.len() == count {
            break;
        }
        let a = points[i];
        let b = points[(i + 1) % n];
        let len = (b - a).norm();
        if len <= EPS {
            continue;
        }
        let mut along = 0.0;
        while out.len() < count && along + to_next <= len + EPS {
            along += to_next;
            let t = (along / len).min(1.0);
            out.push(a + (b - a) * t);
            to_next = step;
        }
        to_next -= len - along;
    }
    // Rounding can leave the final sample just short of an edge end.
    while out.len() < count {
        out.push(points[0]);
    }
    Ok(out)
}
