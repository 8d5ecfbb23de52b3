//! The set of tracked objects and the expansion steps that touch several
//! objects at once.
//!
//! `loosen` blows every active contour up in small increments. Before each
//! increment all contours are checked against each other and nodes within
//! `freeze_threshold` of another object's edge are frozen together with that
//! edge's endpoints, so neighbouring cells stop at their common border instead
//! of merging. With `loosen_step <= freeze_threshold / 2` two objects can close
//! at most `freeze_threshold` per increment, which keeps them from crossing.
//!
//! `implode` is the opposite start: each contour is replaced by a small circle
//! at its centroid that the expanding evolver then grows outward.

use crate::contour::Contour;
use crate::error::{RingError, SetError};
use crate::geometry::{point_segment_distance, regular_polygon, Vec2, EPS};
use crate::options::ExpansionOptions;
use crate::ring::NodeId;
use crate::track::{ObjectTrack, Propagation};
use crate::types::{Bounds, ObjectId};
use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct ObjectSet {
    tracks: Vec<ObjectTrack>,
}

/// Read-only view of one contour used by the contact scan.
struct Outline {
    track: usize,
    nodes: Vec<(NodeId, Vec2)>,
    centroid: Vec2,
    bounds: Bounds,
}

impl Outline {
    fn of(track: usize, contour: &Contour) -> Self {
        Self {
            track,
            nodes: contour.ids().map(|id| (id, contour.node(id).pos)).collect(),
            centroid: contour.centroid(),
            bounds: contour.bounds(),
        }
    }
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track. Object ids must be unique.
    pub fn push(&mut self, track: ObjectTrack) -> Result<(), SetError> {
        if self.get(track.id()).is_some() {
            return Err(SetError::DuplicateObject(track.id()));
        }
        self.tracks.push(track);
        Ok(())
    }

    /// Add an object from seed points, resampled to `node_resolution`.
    pub fn add_object(
        &mut self,
        id: ObjectId,
        start_frame: usize,
        points: &[Vec2],
        node_resolution: f64,
    ) -> Result<(), SetError> {
        if self.get(id).is_some() {
            return Err(SetError::DuplicateObject(id));
        }
        let track = ObjectTrack::from_points(id, start_frame, points, node_resolution)
            .map_err(|source| SetError::InvalidSeed { object: id, source })?;
        self.tracks.push(track);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_alive()).count()
    }

    pub fn tracks(&self) -> &[ObjectTrack] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [ObjectTrack] {
        &mut self.tracks
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectTrack> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectTrack> {
        self.tracks.iter_mut().find(|t| t.id() == id)
    }

    /// Restart every track from its seed, dropping results from `frame` on.
    pub fn reset(&mut self, frame: usize) {
        for track in &mut self.tracks {
            track.truncate_from(frame);
            track.reset();
        }
    }

    pub fn propagate(&mut self, frame: usize, policy: Propagation) {
        for track in &mut self.tracks {
            track.propagate(frame, policy);
        }
    }

    fn active_indices(&self, frame: usize) -> Vec<usize> {
        (0..self.tracks.len())
            .filter(|&i| self.tracks[i].is_active(frame))
            .collect()
    }

    /// Grow all active contours outward by `blowup_amount`, stopping nodes
    /// that come within `freeze_threshold` of another object. Returns the
    /// number of node freezes caused by contacts.
    pub fn loosen(&mut self, frame: usize, options: &ExpansionOptions) -> usize {
        let active = self.active_indices(frame);
        for &i in &active {
            let contour = self.tracks[i].live_mut();
            contour.unfreeze_all();
            contour.update_normals();
        }

        let mut contacts = 0;
        let mut grown = 0.0;
        while grown < options.blowup_amount - EPS {
            let inc = options.loosen_step.min(options.blowup_amount - grown);
            let frozen = self.contact_nodes(&active, options);
            contacts += frozen.len();
            for (track, id) in frozen {
                self.tracks[track].live_mut().freeze(id);
            }
            for &i in &active {
                let contour = self.tracks[i].live_mut();
                contour.shift_along_normals(inc);
                contour.unfreeze_all();
            }
            grown += inc;
        }
        debug!(
            "frame {frame}: loosened {} object(s) by {:.2} with {contacts} contact freeze(s)",
            active.len(),
            grown
        );
        contacts
    }

    /// Nodes to freeze before the next increment, as `(track index, node)`.
    fn contact_nodes(&self, active: &[usize], options: &ExpansionOptions) -> Vec<(usize, NodeId)> {
        let outlines: Vec<Outline> = active
            .iter()
            .map(|&i| Outline::of(i, self.tracks[i].live()))
            .collect();
        let mut pairs = Vec::new();
        for a in 0..outlines.len() {
            for b in (a + 1)..outlines.len() {
                let (oa, ob) = (&outlines[a], &outlines[b]);
                let near = (oa.centroid - ob.centroid).norm() < options.proximity_threshold;
                if near
                    && oa
                        .bounds
                        .inflate(options.freeze_threshold)
                        .intersects(&ob.bounds)
                {
                    pairs.push((a, b));
                }
            }
        }

        let threshold = options.freeze_threshold;
        let scan = |&(a, b): &(usize, usize)| {
            let mut hits = touching(&outlines[a], &outlines[b], threshold);
            hits.extend(touching(&outlines[b], &outlines[a], threshold));
            hits
        };
        #[cfg(feature = "parallel")]
        let found: Vec<Vec<(usize, NodeId)>> = pairs.par_iter().map(scan).collect();
        #[cfg(not(feature = "parallel"))]
        let found: Vec<Vec<(usize, NodeId)>> = pairs.iter().map(scan).collect();
        found.into_iter().flatten().collect()
    }

    /// Replace each active contour with a small regular polygon at its
    /// centroid. Seed node counts are kept so growth limits still refer to the
    /// original seed.
    pub fn implode(
        &mut self,
        frame: usize,
        options: &ExpansionOptions,
        node_resolution: f64,
    ) -> Result<(), RingError> {
        let radius = options.implode_radius;
        let circumference = std::f64::consts::TAU * radius;
        let count = ((circumference / node_resolution).ceil() as usize).max(3);
        for i in self.active_indices(frame) {
            let old = self.tracks[i].live();
            let points = regular_polygon(old.centroid(), radius, count);
            let seed = old.replaced_by(&points)?;
            self.tracks[i].set_live(seed);
        }
        Ok(())
    }
}

/// Nodes of `from` within `threshold` of an edge of `to`, plus the endpoints
/// of every such edge.
fn touching(from: &Outline, to: &Outline, threshold: f64) -> Vec<(usize, NodeId)> {
    let mut out = Vec::new();
    let n = to.nodes.len();
    for &(id, p) in &from.nodes {
        let mut hit = false;
        for k in 0..n {
            let (e0, a) = to.nodes[k];
            let (e1, b) = to.nodes[(k + 1) % n];
            if point_segment_distance(&p, &a, &b) <= threshold {
                hit = true;
                out.push((to.track, e0));
                out.push((to.track, e1));
            }
        }
        if hit {
            out.push((from.track, id));
        }
    }
    out
}
