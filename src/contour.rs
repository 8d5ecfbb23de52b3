//! Contour ("snake"): a [`PolygonRing`] plus per-object evolution state.
//!
//! A contour always keeps its ring positively oriented, so walking it in
//! [`Contour::direction`] traces the outline counter-clockwise (x-right /
//! y-up convention) and the normals produced by
//! [`PolygonRing::compute_normals`] with `inner_facing = true` point into the
//! object. Forces and expansion rely on that.
//!
//! The contour owns the frozen-node bookkeeping: freezing and removal go
//! through it so the frozen count never drifts from the node flags.

use crate::error::RingError;
use crate::geometry::{self, Vec2};
use crate::ring::{Direction, Node, NodeId, PolygonRing, RingIter};
use crate::types::{Bounds, ObjectId};

#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    ring: PolygonRing,
    direction: Direction,
    object_id: ObjectId,
    alive: bool,
    frozen_count: usize,
    seed_node_count: usize,
}

impl Contour {
    /// Build a contour directly from the given vertices.
    pub fn from_points(object_id: ObjectId, points: &[Vec2]) -> Result<Self, RingError> {
        Self::build(object_id, points, 0)
    }

    /// Build a contour from a user seed, resampled to `spacing`.
    pub fn from_seed(object_id: ObjectId, points: &[Vec2], spacing: f64) -> Result<Self, RingError> {
        let mut contour = Self::from_points(object_id, points)?;
        contour.ring.resample(spacing, contour.direction)?;
        contour.frozen_count = 0;
        contour.seed_node_count = contour.len();
        contour.update_normals();
        Ok(contour)
    }

    fn build(object_id: ObjectId, points: &[Vec2], first_track: u64) -> Result<Self, RingError> {
        let ring = PolygonRing::with_first_track(points, first_track)?;
        let direction = if geometry::signed_area(points) < 0.0 {
            Direction::Backward
        } else {
            Direction::Forward
        };
        let mut contour = Self {
            seed_node_count: ring.len(),
            ring,
            direction,
            object_id,
            alive: true,
            frozen_count: 0,
        };
        contour.update_normals();
        Ok(contour)
    }

    /// A contour for the same object with new vertex positions.
    ///
    /// When the vertex count and orientation match, node identities (track
    /// numbers) and velocities are kept and only positions change; otherwise the outline
    /// is rebuilt with fresh track numbers. Seed count and liveness carry
    /// over either way.
    pub fn rebuilt_from(&self, points: &[Vec2]) -> Result<Self, RingError> {
        if points.len() == self.len() && geometry::signed_area(points) > 0.0 {
            let mut out = self.clone();
            let ids: Vec<NodeId> = out.ids().collect();
            for (id, p) in ids.into_iter().zip(points) {
                let node = out.ring.node_mut(id);
                node.pos = *p;
                node.pending = *p;
            }
            out.update_normals();
            return Ok(out);
        }
        self.replaced_by(points)
    }

    /// A new outline for the same object. Nodes get track numbers after
    /// every number this contour has handed out; seed count and liveness
    /// carry over.
    pub fn replaced_by(&self, points: &[Vec2]) -> Result<Self, RingError> {
        let mut out = Self::build(self.object_id, points, self.ring.next_track())?;
        out.seed_node_count = self.seed_node_count;
        out.alive = self.alive;
        Ok(out)
    }

    #[inline]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn head(&self) -> NodeId {
        self.ring.head()
    }

    /// Traversal direction in which the outline is positively oriented.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn ring(&self) -> &PolygonRing {
        &self.ring
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        self.ring.node(id)
    }

    /// Mutable access to a node's kinematic state. Frozen state is changed
    /// through [`Contour::freeze`] / [`Contour::unfreeze`].
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.ring.node_mut(id)
    }

    #[inline]
    pub fn holds(&self, id: NodeId, track: u64) -> bool {
        self.ring.holds(id, track)
    }

    #[inline]
    pub fn next(&self, id: NodeId) -> NodeId {
        self.ring.next(id, self.direction)
    }

    #[inline]
    pub fn prev(&self, id: NodeId) -> NodeId {
        self.ring.prev(id, self.direction)
    }

    pub fn ids(&self) -> RingIter<'_> {
        self.ring.ids(self.direction)
    }

    /// Vertex positions in outline order starting at the head.
    pub fn positions(&self) -> Vec<Vec2> {
        self.ring.positions(self.direction)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the contour as failed. Nothing is rolled back.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub(crate) fn revive(&mut self) {
        self.alive = true;
    }

    #[inline]
    pub fn seed_node_count(&self) -> usize {
        self.seed_node_count
    }

    /// Current node count relative to the seed node count.
    pub fn growth_ratio(&self) -> f64 {
        self.len() as f64 / self.seed_node_count.max(1) as f64
    }

    #[inline]
    pub fn frozen_count(&self) -> usize {
        self.frozen_count
    }

    pub fn all_frozen(&self) -> bool {
        self.frozen_count == self.len()
    }

    pub fn freeze(&mut self, id: NodeId) {
        let node = self.ring.node_mut(id);
        if !node.is_frozen() {
            node.set_frozen(true);
            self.frozen_count += 1;
        }
    }

    pub fn unfreeze(&mut self, id: NodeId) {
        let node = self.ring.node_mut(id);
        if node.is_frozen() {
            node.set_frozen(false);
            self.frozen_count -= 1;
        }
    }

    pub fn unfreeze_all(&mut self) {
        let ids: Vec<NodeId> = self.ids().collect();
        for id in ids {
            self.ring.node_mut(id).set_frozen(false);
        }
        self.frozen_count = 0;
    }

    /// Insert an unfrozen node between `id` and its successor.
    pub fn insert_after(&mut self, id: NodeId, pos: Vec2) -> NodeId {
        self.ring.insert_after(id, self.direction, pos)
    }

    /// Remove a node, keeping the frozen count in step.
    pub fn remove(&mut self, id: NodeId) -> Result<Node, RingError> {
        let node = self.ring.remove(id)?;
        if node.is_frozen() {
            self.frozen_count -= 1;
        }
        Ok(node)
    }

    /// Replace the nodes strictly between `from` and `to` with one node.
    pub fn excise(&mut self, from: NodeId, to: NodeId, pos: Vec2) -> Result<(NodeId, usize), RingError> {
        let (new_id, removed) = self.ring.excise(from, to, self.direction, pos)?;
        let frozen_removed = removed.iter().filter(|n| n.is_frozen()).count();
        self.frozen_count -= frozen_removed;
        Ok((new_id, removed.len()))
    }

    pub fn update_normals(&mut self) {
        self.ring.compute_normals(self.direction, true);
    }

    pub fn update_normal(&mut self, id: NodeId) {
        self.ring.update_normal(id, self.direction, true);
    }

    /// Move every unfrozen node `distance` along its outward normal
    /// (negative distances move inward), then refresh the normals.
    pub fn shift_along_normals(&mut self, distance: f64) {
        let ids: Vec<NodeId> = self.ids().collect();
        for id in ids {
            let node = self.ring.node_mut(id);
            if node.is_frozen() {
                continue;
            }
            node.pos -= node.normal * distance;
            node.pending = node.pos;
        }
        self.update_normals();
    }

    /// Grow (positive) or shrink (negative) the outline by `amount` in
    /// increments of at most `step`.
    pub fn scale(&mut self, amount: f64, step: f64) {
        if step <= 0.0 {
            return;
        }
        let sign = amount.signum();
        let mut remaining = amount.abs();
        while remaining > geometry::EPS {
            let inc = step.min(remaining);
            self.shift_along_normals(sign * inc);
            remaining -= inc;
        }
    }

    pub fn bounds(&self) -> Bounds {
        let positions = self.positions();
        // A ring is never empty, so the fallback is unreachable in practice.
        Bounds::from_points(positions.iter()).unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        })
    }

    pub fn centroid(&self) -> Vec2 {
        geometry::centroid(&self.positions())
    }

    /// Enclosed area (positive for the stored orientation).
    pub fn area(&self) -> f64 {
        geometry::signed_area(&self.positions())
    }

    pub fn perimeter(&self) -> f64 {
        self.ring.perimeter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::regular_polygon;

    fn clockwise_square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 4.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(4.0, 0.0),
        ]
    }

    #[test]
    fn orientation_is_fixed_so_normals_point_inward() {
        let contour = Contour::from_points(ObjectId(1), &clockwise_square()).expect("contour");
        assert_eq!(contour.direction(), Direction::Backward);
        assert!(contour.area() > 0.0);
        let c = contour.centroid();
        for id in contour.ids() {
            let node = contour.node(id);
            assert!(node.normal.dot(&(c - node.pos)) > 0.0);
        }
    }

    #[test]
    fn frozen_count_follows_freeze_and_removal() {
        let pts = regular_polygon(Vec2::zeros(), 10.0, 6);
        let mut contour = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let ids: Vec<NodeId> = contour.ids().collect();
        contour.freeze(ids[0]);
        contour.freeze(ids[0]);
        contour.freeze(ids[1]);
        assert_eq!(contour.frozen_count(), 2);
        contour.remove(ids[1]).expect("removal allowed");
        assert_eq!(contour.frozen_count(), 1);
        contour.unfreeze(ids[0]);
        assert_eq!(contour.frozen_count(), 0);
        for id in contour.ids().collect::<Vec<_>>() {
            contour.freeze(id);
        }
        assert!(contour.all_frozen());
        contour.unfreeze_all();
        assert_eq!(contour.frozen_count(), 0);
    }

    #[test]
    fn growth_ratio_uses_seed_count() {
        let pts = regular_polygon(Vec2::zeros(), 10.0, 6);
        let mut contour = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let head = contour.head();
        contour.insert_after(head, Vec2::new(10.0, 1.0));
        contour.insert_after(head, Vec2::new(10.0, 0.5));
        contour.insert_after(head, Vec2::new(10.0, 0.2));
        assert!((contour.growth_ratio() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn seed_is_resampled_to_node_resolution() {
        let square = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(0.0, 30.0),
        ];
        let contour = Contour::from_seed(ObjectId(3), &square, 6.0).expect("contour");
        assert_eq!(contour.len(), 20);
        assert_eq!(contour.seed_node_count(), 20);
        assert!((contour.perimeter() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn scale_moves_unfrozen_nodes_only() {
        let pts = regular_polygon(Vec2::zeros(), 10.0, 12);
        let mut contour = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let pinned = contour.head();
        contour.freeze(pinned);
        contour.scale(2.0, 0.5);
        assert!((contour.node(pinned).pos - pts[0]).norm() < 1e-12);
        let moved = contour.next(pinned);
        let r = contour.node(moved).pos.norm();
        assert!(r > 11.0 && r < 12.5, "radius after growth {r}");
        contour.unfreeze_all();
        contour.scale(-1.0, 1.0);
        assert!(contour.node(pinned).pos.norm() < 10.0);
    }

    #[test]
    fn rebuilt_from_keeps_tracks_when_counts_match() {
        let pts = regular_polygon(Vec2::zeros(), 10.0, 8);
        let contour = Contour::from_points(ObjectId(4), &pts).expect("contour");
        let shrunk: Vec<Vec2> = contour.positions().iter().map(|p| p * 0.5).collect();
        let same = contour.rebuilt_from(&shrunk).expect("rebuild");
        let before: Vec<u64> = contour.ids().map(|id| contour.node(id).track()).collect();
        let after: Vec<u64> = same.ids().map(|id| same.node(id).track()).collect();
        assert_eq!(before, after);
        assert!((same.area() - contour.area() * 0.25).abs() < 1e-9);

        let fewer = contour.rebuilt_from(&shrunk[..5]).expect("rebuild");
        assert_eq!(fewer.len(), 5);
        assert_eq!(fewer.seed_node_count(), contour.seed_node_count());
        assert!(fewer.node(fewer.head()).track() >= 8);
    }

    #[test]
    fn bounds_cover_all_nodes() {
        let contour = Contour::from_points(ObjectId(1), &clockwise_square()).expect("contour");
        let b = contour.bounds();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 4.0, 4.0));
    }
}
