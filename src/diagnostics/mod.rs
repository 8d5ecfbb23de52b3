//! Serializable run diagnostics.
//!
//! The sequencer returns a `RunReport` with one `FrameReport` per processed
//! frame. Each frame lists what happened to every active object and how long
//! each phase took.

pub mod report;
pub mod timing;

pub use report::{FrameReport, ObjectFrameReport, ObjectStatus, RunReport};
pub use timing::{StageTiming, TimingBreakdown};
