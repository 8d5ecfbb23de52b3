use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall time spent in one phase of a frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Per-phase timings of one frame, in execution order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Record the time since `since` under `label` and return the new origin.
    pub fn lap(&mut self, label: impl Into<String>, since: Instant) -> Instant {
        let now = Instant::now();
        self.stages.push(StageTiming {
            label: label.into(),
            elapsed_ms: elapsed_ms(since, now),
        });
        now
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }

    /// Phase that took longest, if any was recorded.
    pub fn slowest(&self) -> Option<&StageTiming> {
        self.stages
            .iter()
            .max_by(|a, b| a.elapsed_ms.total_cmp(&b.elapsed_ms))
    }
}

pub(crate) fn elapsed_ms(since: Instant, now: Instant) -> f64 {
    now.duration_since(since).as_secs_f64() * 1000.0
}
