//! Run description for the command-line tool.
//!
//! A JSON file lists the frame images, the engine parameters, one seed
//! polygon per object and where to write results:
//!
//! ```text
//! {
//!   "frames": ["t000.png", "t001.png"],
//!   "params": { "topology": { "node_resolution": 4.0 } },
//!   "objects": [ { "id": 1, "points": [[10, 10], [30, 10], [20, 28]] } ],
//!   "output": { "contours_json": "out/contours.json" }
//! }
//! ```

use crate::geometry::Vec2;
use crate::objects::ObjectSet;
use crate::options::SnakeParams;
use crate::types::ObjectId;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TrackerConfig {
    /// Frame images in order; the first one is frame `first_frame`.
    pub frames: Vec<PathBuf>,
    #[serde(default)]
    pub first_frame: usize,
    /// First frame to segment; defaults to `first_frame`.
    #[serde(default)]
    pub start_frame: Option<usize>,
    /// Last frame to segment (inclusive); defaults to the last listed frame.
    #[serde(default)]
    pub end_frame: Option<usize>,
    #[serde(default)]
    pub params: SnakeParams,
    pub objects: Vec<ObjectSeedConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ObjectSeedConfig {
    pub id: ObjectId,
    /// Frame at which the object appears; defaults to the run's start.
    #[serde(default)]
    pub start_frame: Option<usize>,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub contours_json: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

impl TrackerConfig {
    /// Inclusive frame range to process.
    pub fn frame_range(&self) -> Result<(usize, usize), String> {
        let last = self
            .frames
            .len()
            .checked_sub(1)
            .map(|n| self.first_frame + n)
            .ok_or_else(|| "Config lists no frames".to_string())?;
        let start = self.start_frame.unwrap_or(self.first_frame);
        let end = self.end_frame.unwrap_or(last);
        if start < self.first_frame || end > last || end < start {
            return Err(format!(
                "Frame range {start}..={end} is outside the listed frames {}..={last}",
                self.first_frame
            ));
        }
        Ok((start, end))
    }

    /// Seed every configured object, resampled to the configured node
    /// resolution.
    pub fn build_object_set(&self) -> Result<ObjectSet, String> {
        let (start, _) = self.frame_range()?;
        let spacing = self.params.topology.node_resolution;
        let mut set = ObjectSet::new();
        for object in &self.objects {
            let points: Vec<Vec2> = object.points.iter().map(|p| Vec2::new(p[0], p[1])).collect();
            set.add_object(
                object.id,
                object.start_frame.unwrap_or(start),
                &points,
                spacing,
            )
            .map_err(|e| format!("Invalid object {}: {e}", object.id))?;
        }
        Ok(set)
    }
}

pub fn load_config(path: &Path) -> Result<TrackerConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
