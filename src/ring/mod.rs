//! Circular, doubly linked polygon stored in an index arena.
//!
//! Nodes live in a `Vec` of slots and refer to their neighbours by
//! [`NodeId`]. Deleted slots go onto a free list and are reused by later
//! insertions, so ids stay small and nothing ever dangles: a removed node's
//! neighbours are relinked directly and the slot is cleared.
//!
//! Traversal order is always an explicit [`Direction`] argument. `Forward`
//! follows the stored `next` links, `Backward` the `prev` links; every
//! operation that talks about "the next node" takes the direction it means.
//!
//! Each node carries a track number handed out from a per-ring counter. Track
//! numbers only grow, survive `Clone`, and let callers match nodes between a
//! contour and its snapshots.

mod resample;

use crate::error::RingError;
use crate::geometry::{rotate_ccw, unit_or_zero, Vec2};

/// Index of a node slot inside a [`PolygonRing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which stored link counts as the logical successor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// One contour vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pos: Vec2,
    /// Unit normal; inner-facing for contours built by [`crate::contour`].
    pub normal: Vec2,
    pub tangent: Vec2,
    pub velocity: Vec2,
    /// Position computed by the evolver, committed after the read phase.
    pub pending: Vec2,
    frozen: bool,
    track: u64,
    next: NodeId,
    prev: NodeId,
}

impl Node {
    fn new(pos: Vec2, track: u64) -> Self {
        Self {
            pos,
            normal: Vec2::zeros(),
            tangent: Vec2::zeros(),
            velocity: Vec2::zeros(),
            pending: pos,
            frozen: false,
            track,
            next: NodeId(0),
            prev: NodeId(0),
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[inline]
    pub fn track(&self) -> u64 {
        self.track
    }

    #[inline]
    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }
}

/// Closed polygon with O(1) insertion and removal.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonRing {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    head: NodeId,
    len: usize,
    next_track: u64,
}

impl PolygonRing {
    /// Build a ring linking `points` in order (forward = given order).
    pub fn from_points(points: &[Vec2]) -> Result<Self, RingError> {
        Self::with_first_track(points, 0)
    }

    pub(crate) fn with_first_track(points: &[Vec2], first_track: u64) -> Result<Self, RingError> {
        if points.len() < 3 {
            return Err(RingError::TooFewNodes(points.len()));
        }
        let n = points.len();
        let mut slots = Vec::with_capacity(n);
        for (i, p) in points.iter().enumerate() {
            let mut node = Node::new(*p, first_track + i as u64);
            node.next = NodeId(((i + 1) % n) as u32);
            node.prev = NodeId(((i + n - 1) % n) as u32);
            slots.push(Some(node));
        }
        Ok(Self {
            slots,
            free: Vec::new(),
            head: NodeId(0),
            len: n,
            next_track: first_track + n as u64,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// Track number the next inserted node will receive.
    #[inline]
    pub fn next_track(&self) -> u64 {
        self.next_track
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Whether `id` still holds the node that carried `track`.
    pub fn holds(&self, id: NodeId, track: u64) -> bool {
        self.get(id).map_or(false, |n| n.track == track)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Borrow a live node. Panics on a removed or foreign id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} is not part of the ring", id.0),
        }
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {} is not part of the ring", id.0),
        }
    }

    #[inline]
    pub fn next(&self, id: NodeId, dir: Direction) -> NodeId {
        let node = self.node(id);
        match dir {
            Direction::Forward => node.next,
            Direction::Backward => node.prev,
        }
    }

    #[inline]
    pub fn prev(&self, id: NodeId, dir: Direction) -> NodeId {
        self.next(id, dir.reversed())
    }

    /// Node ids starting at the head, following `dir`.
    pub fn ids(&self, dir: Direction) -> RingIter<'_> {
        RingIter {
            ring: self,
            cursor: self.head,
            remaining: self.len,
            dir,
        }
    }

    pub fn positions(&self, dir: Direction) -> Vec<Vec2> {
        self.ids(dir).map(|id| self.node(id).pos).collect()
    }

    /// Sum of edge lengths.
    pub fn perimeter(&self) -> f64 {
        self.ids(Direction::Forward)
            .map(|id| {
                let next = self.next(id, Direction::Forward);
                (self.node(next).pos - self.node(id).pos).norm()
            })
            .sum()
    }

    /// Link a new node at `pos` between `id` and its successor in `dir`.
    pub fn insert_after(&mut self, id: NodeId, dir: Direction, pos: Vec2) -> NodeId {
        let succ = self.next(id, dir);
        let track = self.next_track;
        self.next_track += 1;
        let new_id = self.alloc(Node::new(pos, track));
        self.link(id, new_id, dir);
        self.link(new_id, succ, dir);
        self.len += 1;
        new_id
    }

    /// Unlink `id`, relinking its neighbours. Rejected when fewer than three
    /// nodes would remain; the ring is unchanged in that case.
    pub fn remove(&mut self, id: NodeId) -> Result<Node, RingError> {
        if !self.contains(id) {
            return Err(RingError::UnknownNode(id.0));
        }
        if self.len <= 3 {
            return Err(RingError::TooFewNodes(self.len - 1));
        }
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        self.link(prev, next, Direction::Forward);
        if self.head == id {
            self.head = next;
        }
        self.len -= 1;
        Ok(self.release(id))
    }

    /// Replace every node strictly between `from` and `to` (walking `dir`)
    /// with a single new node at `pos`. Returns the new node and the removed
    /// nodes. The head moves to the new node if it was removed.
    pub fn excise(
        &mut self,
        from: NodeId,
        to: NodeId,
        dir: Direction,
        pos: Vec2,
    ) -> Result<(NodeId, Vec<Node>), RingError> {
        if !self.contains(from) {
            return Err(RingError::UnknownNode(from.0));
        }
        if !self.contains(to) {
            return Err(RingError::UnknownNode(to.0));
        }
        let mut doomed = Vec::new();
        let mut cursor = self.next(from, dir);
        while cursor != to {
            if cursor == from {
                return Err(RingError::UnknownNode(to.0));
            }
            doomed.push(cursor);
            cursor = self.next(cursor, dir);
        }
        let remaining = self.len - doomed.len() + 1;
        if remaining < 3 {
            return Err(RingError::TooFewNodes(remaining));
        }

        let head_removed = doomed.contains(&self.head);
        let removed: Vec<Node> = doomed.into_iter().map(|id| self.release(id)).collect();
        self.len -= removed.len();

        let track = self.next_track;
        self.next_track += 1;
        let new_id = self.alloc(Node::new(pos, track));
        self.link(from, new_id, dir);
        self.link(new_id, to, dir);
        self.len += 1;
        if head_removed {
            self.head = new_id;
        }
        Ok((new_id, removed))
    }

    /// Recompute tangent and normal of every node.
    pub fn compute_normals(&mut self, dir: Direction, inner_facing: bool) {
        let ids: Vec<NodeId> = self.ids(dir).collect();
        for id in ids {
            self.update_normal(id, dir, inner_facing);
        }
    }

    /// Recompute tangent and normal of a single node from its neighbours.
    ///
    /// The tangent runs from the unit vector toward the previous node to the
    /// unit vector toward the next one; the normal is the tangent rotated by
    /// 90°, which is inner-facing for positively oriented traversal.
    pub fn update_normal(&mut self, id: NodeId, dir: Direction, inner_facing: bool) {
        let prev = self.node(self.prev(id, dir)).pos;
        let next = self.node(self.next(id, dir)).pos;
        let pos = self.node(id).pos;
        let to_prev = unit_or_zero(prev - pos);
        let to_next = unit_or_zero(next - pos);
        let mut tangent = unit_or_zero(to_next - to_prev);
        if tangent == Vec2::zeros() {
            // Spike or coincident neighbours: fall back to the edge direction.
            tangent = unit_or_zero(next - prev);
            if tangent == Vec2::zeros() {
                tangent = Vec2::new(1.0, 0.0);
            }
        }
        let mut normal = rotate_ccw(tangent);
        if !inner_facing {
            normal = -normal;
        }
        let node = self.node_mut(id);
        node.tangent = tangent;
        node.normal = normal;
    }

    /// Check that every link is mirrored and the cycle from the head visits
    /// exactly `len` nodes.
    pub fn is_consistent(&self) -> bool {
        let live = self.slots.iter().filter(|s| s.is_some()).count();
        if live != self.len || !self.contains(self.head) {
            return false;
        }
        let mut cursor = self.head;
        for _ in 0..self.len {
            let node = self.node(cursor);
            if !self.contains(node.next) || self.node(node.next).prev != cursor {
                return false;
            }
            cursor = node.next;
        }
        cursor == self.head
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId((self.slots.len() - 1) as u32)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        self.free.push(id.0);
        match self.slots[id.index()].take() {
            Some(node) => node,
            None => panic!("node {} released twice", id.0),
        }
    }

    /// Make `b` the successor of `a` in direction `dir`.
    fn link(&mut self, a: NodeId, b: NodeId, dir: Direction) {
        let (first, second) = match dir {
            Direction::Forward => (a, b),
            Direction::Backward => (b, a),
        };
        self.node_mut(first).next = second;
        self.node_mut(second).prev = first;
    }
}

/// Iterator over the node ids of a ring, starting at the head.
pub struct RingIter<'a> {
    ring: &'a PolygonRing,
    cursor: NodeId,
    remaining: usize,
    dir: Direction,
}

impl Iterator for RingIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor;
        self.remaining -= 1;
        self.cursor = self.ring.next(id, self.dir);
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RingIter<'_> {}

#[cfg(test)]
mod tests;
