//! Node-density maintenance and loop excision.
//!
//! `correct_distance` keeps neighbouring nodes between the limits derived from
//! the node resolution by relocating, deleting or inserting nodes. The `cut_*`
//! passes look for an edge crossing a later edge of the same contour and cut
//! out the loop between them, leaving a single node at the crossing.
//!
//! Loop detection only looks a bounded number of edges ahead. `cut_loops`
//! uses the short `loop_window` lookahead and runs inside the evolution loop;
//! `cut_intersects` scans half the ring and is meant for the once-per-frame
//! cleanup. Neither guarantees a simple polygon.

use crate::contour::Contour;
use crate::geometry::{rotate_ccw, segment_intersection, unit_or_zero, Vec2, EPS};
use crate::options::TopologyOptions;
use crate::ring::NodeId;
use log::debug;

/// Allowed neighbour distance range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceLimits {
    pub min: f64,
    pub max: f64,
}

impl DistanceLimits {
    pub fn for_resolution(node_resolution: f64) -> Self {
        if node_resolution < 1.0 {
            Self { min: 1.0, max: 2.3 }
        } else {
            Self {
                min: node_resolution,
                max: 1.9 * node_resolution,
            }
        }
    }
}

const MAX_CLEANUP_PASSES: usize = 32;

#[derive(Clone, Debug)]
pub struct TopologyMaintainer {
    options: TopologyOptions,
    limits: DistanceLimits,
    critical_velocity: f64,
}

impl TopologyMaintainer {
    pub fn new(options: TopologyOptions, critical_velocity: f64) -> Self {
        let limits = DistanceLimits::for_resolution(options.node_resolution);
        Self {
            options,
            limits,
            critical_velocity,
        }
    }

    pub fn limits(&self) -> DistanceLimits {
        self.limits
    }

    pub fn options(&self) -> &TopologyOptions {
        &self.options
    }

    /// One pass over the contour fixing neighbour distances. Returns whether
    /// anything changed.
    ///
    /// An unfrozen node closer than `min` to a neighbour moves to the midpoint
    /// between its neighbours when they are at least `2 × min` apart.
    /// Otherwise it is deleted, unless the neighbour it is too close to can
    /// itself be moved that way. Edges longer than `max` get a node at their
    /// midpoint; with `shift_new_node` it is nudged outward.
    pub fn correct_distance(&self, contour: &mut Contour, shift_new_node: bool) -> bool {
        let DistanceLimits { min, max } = self.limits;
        let snapshot: Vec<(NodeId, u64)> = contour
            .ids()
            .map(|id| (id, contour.node(id).track()))
            .collect();
        let mut changed = false;

        for (id, track) in snapshot {
            if !contour.holds(id, track) {
                continue;
            }
            let prev = contour.prev(id);
            let next = contour.next(id);
            let p_prev = contour.node(prev).pos;
            let p_next = contour.node(next).pos;
            let pos = contour.node(id).pos;
            let d_prev = (pos - p_prev).norm();
            let d_next = (p_next - pos).norm();

            if !contour.node(id).is_frozen() && (d_prev < min || d_next < min) {
                let gap = (p_next - p_prev).norm();
                if gap >= 2.0 * min {
                    let target = relocated(pos, p_prev, p_next, 0.05 * min);
                    let node = contour.node_mut(id);
                    node.pos = target;
                    node.pending = target;
                    contour.unfreeze(id);
                    contour.update_normal(prev);
                    contour.update_normal(id);
                    contour.update_normal(next);
                    changed = true;
                } else {
                    let (near, far) = if d_prev <= d_next {
                        (prev, contour.prev(prev))
                    } else {
                        (next, contour.next(next))
                    };
                    let near_movable = !contour.node(near).is_frozen()
                        && (contour.node(far).pos - pos).norm() >= 2.0 * min;
                    if near_movable {
                        continue;
                    }
                    if contour.len() > 3 && contour.remove(id).is_ok() {
                        contour.update_normal(prev);
                        contour.update_normal(next);
                        changed = true;
                    }
                    continue;
                }
            }

            let pos = contour.node(id).pos;
            if (p_next - pos).norm() > max {
                self.split_edge(contour, id, shift_new_node);
                changed = true;
            }
        }
        changed
    }

    fn split_edge(&self, contour: &mut Contour, id: NodeId, shift_new_node: bool) {
        let next = contour.next(id);
        let (a, b) = (contour.node(id), contour.node(next));
        let mid = (a.pos + b.pos) * 0.5;
        let mut velocity = (a.velocity + b.velocity) * 0.5;

        let new_id = contour.insert_after(id, mid);
        contour.update_normal(new_id);
        let floor = 1.5 * self.critical_velocity;
        let speed = velocity.norm();
        if speed < floor {
            velocity = if speed > EPS {
                velocity * (floor / speed)
            } else {
                contour.node(new_id).normal * floor
            };
        }
        let node = contour.node_mut(new_id);
        node.velocity = velocity;
        if shift_new_node {
            node.pos -= node.normal * (0.1 * self.limits.min);
        }
        node.pending = node.pos;
        contour.update_normal(id);
        contour.update_normal(new_id);
        contour.update_normal(next);
    }

    /// Excise short loops found within `loop_window` edges ahead.
    /// Returns the number of cuts.
    pub fn cut_loops(&self, contour: &mut Contour) -> usize {
        self.cut_within(contour, |_| self.options.loop_window)
    }

    /// Excise loops found within half the ring. Returns the number of cuts.
    pub fn cut_intersects(&self, contour: &mut Contour) -> usize {
        self.cut_within(contour, |len| len / 2)
    }

    /// Repeat [`Self::cut_intersects`] until a pass finds nothing (bounded).
    pub fn cut_self_intersects(&self, contour: &mut Contour) -> usize {
        let mut total = 0;
        for _ in 0..MAX_CLEANUP_PASSES {
            let cuts = self.cut_intersects(contour);
            if cuts == 0 {
                break;
            }
            total += cuts;
        }
        total
    }

    fn cut_within(&self, contour: &mut Contour, window: impl Fn(usize) -> usize) -> usize {
        let snapshot: Vec<(NodeId, u64)> = contour
            .ids()
            .map(|id| (id, contour.node(id).track()))
            .collect();
        let mut cuts = 0;
        for (a, track) in snapshot {
            if contour.len() < 4 {
                break;
            }
            if !contour.holds(a, track) {
                continue;
            }
            if let Some(crossing) = find_crossing(contour, a, window(contour.len())) {
                if excise_loop(contour, a, crossing) {
                    cuts += 1;
                }
            }
        }
        if cuts > 0 {
            debug_assert!(contour.ring().is_consistent());
            debug!(
                "object {}: cut {cuts} loop(s), {} nodes left",
                contour.object_id(),
                contour.len()
            );
        }
        cuts
    }
}

/// Midpoint of the chord `a`–`b`, offset perpendicular toward the side `pos`
/// lies on by at most `max_offset`.
fn relocated(pos: Vec2, a: Vec2, b: Vec2, max_offset: f64) -> Vec2 {
    let mid = (a + b) * 0.5;
    let across = rotate_ccw(unit_or_zero(b - a));
    let side = (pos - mid).dot(&across);
    mid + across * (side.signum() * side.abs().min(max_offset))
}

struct Crossing {
    /// Last node of the far edge; everything strictly between `a` and it goes.
    far_end: NodeId,
    point: Vec2,
    /// Position of the crossing along the edge leaving `a`.
    t: f64,
}

fn find_crossing(contour: &Contour, a: NodeId, window: usize) -> Option<Crossing> {
    let window = window.min(contour.len().saturating_sub(3));
    let a1 = contour.next(a);
    let (pa, pa1) = (contour.node(a).pos, contour.node(a1).pos);
    let mut c = contour.next(a1);
    for _ in 0..window {
        let c1 = contour.next(c);
        if c1 == a {
            break;
        }
        let (pc, pc1) = (contour.node(c).pos, contour.node(c1).pos);
        if let Some((point, t, _)) = segment_intersection(&pa, &pa1, &pc, &pc1) {
            return Some(Crossing {
                far_end: c1,
                point,
                t,
            });
        }
        c = c1;
    }
    None
}

fn excise_loop(contour: &mut Contour, a: NodeId, crossing: Crossing) -> bool {
    let a1 = contour.next(a);
    let velocity = contour.node(a).velocity.lerp(&contour.node(a1).velocity, crossing.t);
    match contour.excise(a, crossing.far_end, crossing.point) {
        Ok((new_id, _)) => {
            contour.node_mut(new_id).velocity = velocity;
            contour.update_normal(a);
            contour.update_normal(new_id);
            contour.update_normal(crossing.far_end);
            true
        }
        Err(_) => false,
    }
}
