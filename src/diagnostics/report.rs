use crate::diagnostics::TimingBreakdown;
use crate::types::{Bounds, ObjectId};
use serde::{Deserialize, Serialize};

/// How an object's evolution ended in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectStatus {
    /// Every node froze before the iteration limit.
    Converged,
    /// Stopped at `max_iterations` with nodes still moving.
    IterationLimit,
    /// Node count grew past the allowed ratio; the object was killed.
    Failed,
}

/// Outcome of one object in one frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFrameReport {
    pub object: ObjectId,
    pub status: ObjectStatus,
    pub iterations: usize,
    pub loops_cut: usize,
    pub nodes: usize,
    pub growth_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// The post-processing hook failed and the backup was stored instead.
    pub used_backup: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub frame: usize,
    pub alive_objects: usize,
    pub objects: Vec<ObjectFrameReport>,
    pub timings: TimingBreakdown,
}

impl FrameReport {
    pub fn object(&self, id: ObjectId) -> Option<&ObjectFrameReport> {
        self.objects.iter().find(|o| o.object == id)
    }
}

/// Everything a completed run reports, frame by frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub start_frame: usize,
    pub end_frame: usize,
    pub total_ms: f64,
    pub frames: Vec<FrameReport>,
}

impl RunReport {
    pub fn new(start_frame: usize, end_frame: usize) -> Self {
        Self {
            start_frame,
            end_frame,
            total_ms: 0.0,
            frames: Vec::new(),
        }
    }

    pub fn frame(&self, frame: usize) -> Option<&FrameReport> {
        self.frames.iter().find(|f| f.frame == frame)
    }
}
