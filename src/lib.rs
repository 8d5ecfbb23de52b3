#![doc = include_str!("../README.md")]

// Public modules (stable surface)
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod objects;
pub mod options;
pub mod sequencer;
pub mod track;
pub mod types;

// Building blocks, public for tools and tests.
pub mod evolve;
pub mod geometry;
pub mod ring;
pub mod topology;

// --- High-level re-exports -------------------------------------------------

// Main entry points: object set + sequencer.
pub use crate::objects::ObjectSet;
pub use crate::options::SnakeParams;
pub use crate::sequencer::{FrameSequencer, Identity, PostProcess};

// Per-run diagnostics returned by the sequencer.
pub use crate::diagnostics::{FrameReport, RunReport};

pub use crate::error::SequencerError;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use snake_tracker::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (w, h) = (128usize, 128usize);
/// let frames = FrameStack::new(0, vec![GrayImageU8::new(w, h, vec![0u8; w * h])]);
///
/// let mut set = ObjectSet::new();
/// let seed = [
///     Vec2::new(40.0, 40.0),
///     Vec2::new(90.0, 40.0),
///     Vec2::new(90.0, 90.0),
///     Vec2::new(40.0, 90.0),
/// ];
/// set.add_object(ObjectId(1), 0, &seed, 4.0)?;
///
/// let mut seq = FrameSequencer::new(SnakeParams::default());
/// let report = seq.run(&mut set, &frames, 0, 0, &Identity)?;
/// println!("alive={} ms={:.1}", report.frames[0].alive_objects, report.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::contour::Contour;
    pub use crate::diagnostics::{FrameReport, ObjectFrameReport, ObjectStatus, RunReport};
    pub use crate::error::{PostProcessError, SequencerError, SetError};
    pub use crate::geometry::Vec2;
    pub use crate::image::{FrameSource, FrameStack, GrayImageU8, ImageF32, ImageU8, IntensitySampler};
    pub use crate::objects::ObjectSet;
    pub use crate::options::{
        EvolveOptions, ExpansionOptions, SequenceOptions, SnakeParams, TopologyOptions,
    };
    pub use crate::sequencer::{FrameSequencer, Identity, Phase, PostProcess, SequencerState};
    pub use crate::track::{ObjectTrack, Propagation};
    pub use crate::types::{Bounds, ObjectId};
}
