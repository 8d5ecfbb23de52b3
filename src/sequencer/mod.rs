//! Frame-by-frame orchestration.
//!
//! For every frame in the requested range the sequencer
//!
//! 1. propagates each track's live contour (skipped at the start frame),
//! 2. expands the contours (`implode` in expanding mode, `loosen` otherwise),
//! 3. evolves every active object until it converges or hits
//!    `max_iterations`, cutting loops and correcting node distances on a
//!    fixed schedule,
//! 4. finalizes survivors: shrink, loop cleanup (repeated while the outline
//!    still crosses itself), backup snapshot,
//!    post-processing hook, finalized snapshot.
//!
//! Objects whose node count grows past `max_node_growth_ratio` fail and are
//! marked dead. With [`Propagation::UsePrevious`] a failure also aborts the
//! run because later frames would start from a broken contour; with
//! [`Propagation::ResetPerFrame`] the run continues without the object.

mod hook;

pub use hook::{Identity, PostProcess};

use crate::contour::Contour;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{FrameReport, ObjectFrameReport, ObjectStatus, RunReport, TimingBreakdown};
use crate::error::{PostProcessError, SequencerError};
use crate::evolve::{Drive, Evolver};
use crate::geometry::has_self_intersection;
use crate::image::{FrameSource, IntensitySampler};
use crate::objects::ObjectSet;
use crate::options::SnakeParams;
use crate::topology::TopologyMaintainer;
use crate::track::{ObjectTrack, Propagation};
use crate::types::ObjectId;
use log::{debug, info, warn};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Step of the per-frame pipeline currently executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Propagate,
    Expand,
    EvolveIterate,
    Finalize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequencerState {
    #[default]
    Idle,
    Running { frame: usize, phase: Phase },
    Aborted { frame: usize },
}

/// Result of evolving one contour within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvolveOutcome {
    pub status: ObjectStatus,
    pub iterations: usize,
    pub loops_cut: usize,
}

#[derive(Clone, Debug)]
pub struct FrameSequencer {
    params: SnakeParams,
    evolver: Evolver,
    topology: TopologyMaintainer,
    state: SequencerState,
}

impl FrameSequencer {
    pub fn new(params: SnakeParams) -> Self {
        let drive = if params.expansion.expand_mode {
            Drive::Expanding
        } else {
            Drive::Contracting
        };
        let evolver = Evolver::new(params.evolve.clone()).with_drive(drive);
        let topology =
            TopologyMaintainer::new(params.topology.clone(), params.evolve.critical_velocity);
        Self {
            params,
            evolver,
            topology,
            state: SequencerState::Idle,
        }
    }

    pub fn params(&self) -> &SnakeParams {
        &self.params
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn propagation(&self) -> Propagation {
        Propagation::from_use_previous(self.params.sequence.use_previous_snake)
    }

    /// Segment frames `start..=end`. See [`Self::run_with_progress`].
    pub fn run<F, H>(
        &mut self,
        set: &mut ObjectSet,
        frames: &F,
        start: usize,
        end: usize,
        hook: &H,
    ) -> Result<RunReport, SequencerError>
    where
        F: FrameSource,
        H: PostProcess + ?Sized,
    {
        self.run_with_progress(set, frames, start, end, hook, |_| {})
    }

    /// Segment frames `start..=end`, calling `on_frame` after each frame.
    ///
    /// The set is reset to its seeds first; snapshots from `start` on are
    /// replaced. On error the state is left at [`SequencerState::Aborted`]
    /// and snapshots of completed frames stay in the set.
    pub fn run_with_progress<F, H, P>(
        &mut self,
        set: &mut ObjectSet,
        frames: &F,
        start: usize,
        end: usize,
        hook: &H,
        mut on_frame: P,
    ) -> Result<RunReport, SequencerError>
    where
        F: FrameSource,
        H: PostProcess + ?Sized,
        P: FnMut(&FrameReport),
    {
        self.params.validate()?;
        if set.is_empty() {
            return Err(SequencerError::NoObjects);
        }
        if end < start {
            return Err(SequencerError::InvalidRange { start, end });
        }

        let run_start = Instant::now();
        set.reset(start);
        let mut report = RunReport::new(start, end);
        for frame in start..=end {
            let Some(image) = frames.frame(frame) else {
                return Err(self.abort(frame, SequencerError::MissingFrame { frame }));
            };
            let frame_report = self.process_frame(set, frame, frame == start, image, hook)?;
            info!(
                "frame {frame}: {} of {} object(s) alive, {:.1} ms",
                frame_report.alive_objects,
                set.len(),
                frame_report.timings.total_ms
            );
            if let Some(stage) = frame_report.timings.slowest() {
                debug!("frame {frame}: slowest phase {} ({:.1} ms)", stage.label, stage.elapsed_ms);
            }
            on_frame(&frame_report);
            report.frames.push(frame_report);
        }
        report.total_ms = elapsed_ms(run_start, Instant::now());
        self.state = SequencerState::Idle;
        Ok(report)
    }

    fn abort(&mut self, frame: usize, err: SequencerError) -> SequencerError {
        self.state = SequencerState::Aborted { frame };
        err
    }

    fn enter(&mut self, frame: usize, phase: Phase) {
        self.state = SequencerState::Running { frame, phase };
    }

    fn process_frame<S, H>(
        &mut self,
        set: &mut ObjectSet,
        frame: usize,
        first: bool,
        image: &S,
        hook: &H,
    ) -> Result<FrameReport, SequencerError>
    where
        S: IntensitySampler + ?Sized,
        H: PostProcess + ?Sized,
    {
        let frame_start = Instant::now();
        let mut timings = TimingBreakdown::default();

        self.enter(frame, Phase::Propagate);
        if !first {
            set.propagate(frame, self.propagation());
        }
        let mut lap = timings.lap("propagate", frame_start);

        self.enter(frame, Phase::Expand);
        let expansion = &self.params.expansion;
        if expansion.expand_mode {
            let node_resolution = self.params.topology.node_resolution;
            if let Err(err) = set.implode(frame, expansion, node_resolution) {
                warn!("frame {frame}: implode failed, keeping current contours: {err}");
            }
        } else {
            set.loosen(frame, expansion);
        }
        lap = timings.lap("expand", lap);

        self.enter(frame, Phase::EvolveIterate);
        let outcomes = self.evolve_all(set, frame, image);
        for &(object, outcome) in &outcomes {
            if outcome.status != ObjectStatus::Failed {
                continue;
            }
            if let Some(track) = set.get_mut(object) {
                track.kill();
            }
            match self.propagation() {
                Propagation::UsePrevious => {
                    return Err(self.abort(frame, SequencerError::ObjectFailed { frame, object }));
                }
                Propagation::ResetPerFrame => {
                    warn!(
                        "frame {frame}: object {object} exceeded the node growth limit, dropping it"
                    );
                }
            }
        }
        if set.alive_count() == 0 {
            return Err(self.abort(frame, SequencerError::AllObjectsDead { frame }));
        }
        lap = timings.lap("evolve", lap);

        self.enter(frame, Phase::Finalize);
        let mut objects = Vec::with_capacity(outcomes.len());
        for (object, outcome) in outcomes {
            let Some(track) = set.get_mut(object) else {
                continue;
            };
            let mut used_backup = false;
            if outcome.status != ObjectStatus::Failed {
                used_backup = self.finalize(track, frame, hook);
            }
            let live = track.live();
            let finished = outcome.status != ObjectStatus::Failed;
            objects.push(ObjectFrameReport {
                object,
                status: outcome.status,
                iterations: outcome.iterations,
                loops_cut: outcome.loops_cut,
                nodes: live.len(),
                growth_ratio: live.growth_ratio(),
                area: finished.then(|| live.area()),
                bounds: finished.then(|| live.bounds()),
                used_backup,
            });
        }
        timings.lap("finalize", lap);
        timings.total_ms = elapsed_ms(frame_start, Instant::now());

        Ok(FrameReport {
            frame,
            alive_objects: set.alive_count(),
            objects,
            timings,
        })
    }

    fn evolve_all<S>(&self, set: &mut ObjectSet, frame: usize, image: &S) -> Vec<(ObjectId, EvolveOutcome)>
    where
        S: IntensitySampler + ?Sized,
    {
        let run = |track: &mut ObjectTrack| (track.id(), self.evolve_contour(track.live_mut(), image));
        #[cfg(feature = "parallel")]
        {
            set.tracks_mut()
                .par_iter_mut()
                .filter(|t| t.is_active(frame))
                .map(run)
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            set.tracks_mut()
                .iter_mut()
                .filter(|t| t.is_active(frame))
                .map(run)
                .collect()
        }
    }

    /// Run the evolver on one contour until it converges, fails or reaches
    /// the iteration limit.
    pub fn evolve_contour<S>(&self, contour: &mut Contour, image: &S) -> EvolveOutcome
    where
        S: IntensitySampler + ?Sized,
    {
        let topo = &self.params.topology;
        let max_growth = self.params.sequence.max_node_growth_ratio;
        let mut loops_cut = 0;
        contour.unfreeze_all();
        for i in 1..=self.params.sequence.max_iterations {
            self.evolver.step(contour, image);
            if i % topo.cut_every == 0 {
                loops_cut += self.topology.cut_loops(contour);
            }
            if i % topo.correct_every == 0 {
                self.topology.correct_distance(contour, true);
            }
            if contour.growth_ratio() > max_growth {
                debug!(
                    "object {}: {} nodes after {i} iterations, seed had {}",
                    contour.object_id(),
                    contour.len(),
                    contour.seed_node_count()
                );
                return EvolveOutcome {
                    status: ObjectStatus::Failed,
                    iterations: i,
                    loops_cut,
                };
            }
            if contour.all_frozen() {
                return EvolveOutcome {
                    status: ObjectStatus::Converged,
                    iterations: i,
                    loops_cut,
                };
            }
        }
        EvolveOutcome {
            status: ObjectStatus::IterationLimit,
            iterations: self.params.sequence.max_iterations,
            loops_cut,
        }
    }

    /// Shrink, clean up and store one object's result. Returns whether the
    /// hook failed and the backup was stored instead.
    fn finalize<H>(&self, track: &mut ObjectTrack, frame: usize, hook: &H) -> bool
    where
        H: PostProcess + ?Sized,
    {
        let seq = &self.params.sequence;
        let contour = track.live_mut();
        contour.unfreeze_all();
        contour.scale(-seq.final_shrink, seq.shrink_step);
        self.topology.cut_intersects(contour);
        self.topology.cut_loops(contour);
        if has_self_intersection(&contour.positions()) {
            let extra = self.topology.cut_self_intersects(contour);
            debug!(
                "frame {frame}: object {}: {extra} more loop(s) cut before the backup",
                contour.object_id()
            );
        }
        contour.update_normals();
        track.store_backup(frame);

        let object = track.id();
        let raw = track.live().positions();
        let processed = hook.apply(&raw, object, frame).and_then(|points| {
            track
                .live()
                .rebuilt_from(&points)
                .map_err(|e| PostProcessError(e.to_string()))
        });
        match processed {
            Ok(contour) => {
                track.store_finalized(frame, contour);
                false
            }
            Err(err) => {
                warn!("frame {frame}: object {object}: {err}; keeping the unprocessed contour");
                let backup = track.live().clone();
                track.store_finalized(frame, backup);
                true
            }
        }
    }
}
