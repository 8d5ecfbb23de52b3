//! Error types surfaced by the engine.
//!
//! Only a handful of conditions ever reach the caller: ring operations that
//! would break the three-node minimum, invalid options, and the batch-fatal
//! sequencer errors. Local node anomalies are repaired in place.

use crate::types::ObjectId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RingError {
    #[error("a contour needs at least 3 nodes, got {0}")]
    TooFewNodes(usize),

    #[error("polygon has zero perimeter")]
    Degenerate,

    #[error("node slot {0} is not part of the ring")]
    UnknownNode(u32),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OptionsError {
    #[error("friction must lie in (0, 1], got {0}")]
    Friction(f64),

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be at least 1")]
    ZeroCount { name: &'static str },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SetError {
    #[error("object {0} is already part of the set")]
    DuplicateObject(ObjectId),

    #[error("invalid seed for object {object}: {source}")]
    InvalidSeed {
        object: ObjectId,
        #[source]
        source: RingError,
    },
}

/// Failure reported by an external post-processing hook.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("post-processing failed: {0}")]
pub struct PostProcessError(pub String);

/// Batch-fatal conditions that terminate a run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SequencerError {
    #[error("no objects to segment")]
    NoObjects,

    #[error("invalid frame range {start}..={end}")]
    InvalidRange { start: usize, end: usize },

    #[error("frame {frame} is not available from the frame source")]
    MissingFrame { frame: usize },

    #[error("object {object} failed at frame {frame} while propagating previous contours")]
    ObjectFailed { frame: usize, object: ObjectId },

    #[error("all objects died; last frame reached was {frame}")]
    AllObjectsDead { frame: usize },

    #[error(transparent)]
    Options(#[from] OptionsError),
}
