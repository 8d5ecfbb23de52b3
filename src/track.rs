//! Per-object history across frames.

use crate::contour::Contour;
use crate::error::RingError;
use crate::geometry::Vec2;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the live contour of a frame starts from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Propagation {
    /// The previous frame's finalized contour (the seed at the start frame).
    /// A failed object aborts the run since later frames depend on it.
    #[default]
    UsePrevious,
    /// The seed, every frame. Failed objects are dropped and the run goes on.
    ResetPerFrame,
}

impl Propagation {
    pub fn from_use_previous(use_previous: bool) -> Self {
        if use_previous {
            Propagation::UsePrevious
        } else {
            Propagation::ResetPerFrame
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectTrack {
    id: ObjectId,
    start_frame: usize,
    seed: Contour,
    live: Contour,
    backups: BTreeMap<usize, Contour>,
    finalized: BTreeMap<usize, Contour>,
}

impl ObjectTrack {
    pub fn new(seed: Contour, start_frame: usize) -> Self {
        Self {
            id: seed.object_id(),
            start_frame,
            live: seed.clone(),
            seed,
            backups: BTreeMap::new(),
            finalized: BTreeMap::new(),
        }
    }

    /// Track seeded from user points, resampled to `node_resolution`.
    pub fn from_points(
        id: ObjectId,
        start_frame: usize,
        points: &[Vec2],
        node_resolution: f64,
    ) -> Result<Self, RingError> {
        let seed = Contour::from_seed(id, points, node_resolution)?;
        Ok(Self::new(seed, start_frame))
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    /// Last frame with a finalized snapshot.
    pub fn end_frame(&self) -> Option<usize> {
        self.finalized.keys().next_back().copied()
    }

    #[inline]
    pub fn is_started(&self, frame: usize) -> bool {
        frame >= self.start_frame
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.live.is_alive()
    }

    /// Alive and started at `frame`.
    #[inline]
    pub fn is_active(&self, frame: usize) -> bool {
        self.is_alive() && self.is_started(frame)
    }

    pub fn seed(&self) -> &Contour {
        &self.seed
    }

    pub fn live(&self) -> &Contour {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut Contour {
        &mut self.live
    }

    pub fn set_live(&mut self, contour: Contour) {
        self.live = contour;
    }

    pub fn kill(&mut self) {
        self.live.kill();
    }

    /// Live contour back to the seed, alive again.
    pub fn reset(&mut self) {
        self.live = self.seed.clone();
        self.live.revive();
    }

    /// Drop every snapshot at or after `frame`.
    pub fn truncate_from(&mut self, frame: usize) {
        self.backups.split_off(&frame);
        self.finalized.split_off(&frame);
    }

    /// Prepare the live contour for `frame`. Dead or not-yet-started tracks
    /// are left alone.
    pub fn propagate(&mut self, frame: usize, policy: Propagation) {
        if !self.is_active(frame) {
            return;
        }
        let source = match policy {
            Propagation::UsePrevious => frame
                .checked_sub(1)
                .and_then(|prev| self.finalized.get(&prev))
                .unwrap_or(&self.seed),
            Propagation::ResetPerFrame => &self.seed,
        };
        self.live = source.clone();
        self.live.revive();
    }

    /// Record the current live contour as the backup for `frame`.
    pub fn store_backup(&mut self, frame: usize) {
        self.backups.insert(frame, self.live.clone());
    }

    /// Record the finalized contour for `frame`; it also becomes the live one.
    pub fn store_finalized(&mut self, frame: usize, contour: Contour) {
        self.live = contour.clone();
        self.finalized.insert(frame, contour);
    }

    pub fn backup(&self, frame: usize) -> Option<&Contour> {
        self.backups.get(&frame)
    }

    pub fn finalized(&self, frame: usize) -> Option<&Contour> {
        self.finalized.get(&frame)
    }

    /// Finalized snapshots in frame order.
    pub fn finalized_frames(&self) -> impl Iterator<Item = (usize, &Contour)> + '_ {
        self.finalized.iter().map(|(&f, c)| (f, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::regular_polygon;

    fn track() -> ObjectTrack {
        let pts = regular_polygon(Vec2::new(20.0, 20.0), 10.0, 12);
        ObjectTrack::from_points(ObjectId(2), 3, &pts, 4.0).expect("track")
    }

    #[test]
    fn use_previous_copies_last_finalized_snapshot() {
        let mut t = track();
        t.propagate(3, Propagation::UsePrevious);
        assert_eq!(t.live(), t.seed());

        t.live_mut().scale(-2.0, 1.0);
        t.store_backup(3);
        let done = t.live().clone();
        t.store_finalized(3, done.clone());
        t.set_live(t.seed().clone());

        t.propagate(4, Propagation::UsePrevious);
        assert_eq!(t.live(), &done);
        t.propagate(4, Propagation::ResetPerFrame);
        assert_eq!(t.live(), t.seed());
    }

    #[test]
    fn queries_outside_recorded_range_are_absent() {
        let mut t = track();
        t.store_backup(3);
        t.store_finalized(3, t.live().clone());
        t.store_backup(4);
        t.store_finalized(4, t.live().clone());
        assert!(t.finalized(2).is_none());
        assert!(t.finalized(5).is_none());
        assert_eq!(t.end_frame(), Some(4));

        t.truncate_from(4);
        assert!(t.finalized(4).is_none());
        assert!(t.backup(4).is_none());
        assert!(t.finalized(3).is_some());
    }

    #[test]
    fn dead_tracks_stay_dead_until_reset() {
        let mut t = track();
        t.kill();
        t.propagate(3, Propagation::ResetPerFrame);
        assert!(!t.is_alive());
        t.reset();
        assert!(t.is_alive());
        assert!(!t.is_active(2));
        assert!(t.is_active(3));
    }
}
