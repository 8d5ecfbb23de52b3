//! Parameter types configuring the segmentation engine.
//!
//! The knobs are grouped by the stage that reads them: force integration,
//! node-density maintenance, pre-evolution expansion and the per-frame
//! schedule. Every group deserializes with defaults so a run description only
//! needs to list what it changes.
//!
//! Defaults suit fluorescence frames with cells roughly 20–60 px across. For
//! tuning, start with `node_resolution` and the central / image weights.

use crate::error::OptionsError;
use serde::{Deserialize, Serialize};

/// Force weights and integration settings used by the evolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolveOptions {
    /// Constant pull along the inward normal.
    pub central_weight: f64,
    /// Weight of the discrete curvature-reduction term.
    pub contraction_weight: f64,
    /// Weight of the contrast-driven image force.
    pub image_weight: f64,
    /// Velocity damping factor applied after every step, in (0, 1].
    pub friction: f64,
    /// Nodes slower than this freeze.
    pub critical_velocity: f64,
    /// Integration time step.
    pub dt: f64,
    /// Width (px) of the sampling windows along the tangent.
    pub sample_tan: usize,
    /// Total depth (px) of both sampling windows along the normal.
    pub sample_norm: usize,
}

impl Default for EvolveOptions {
    fn default() -> Self {
        Self {
            central_weight: 0.04,
            contraction_weight: 0.04,
            image_weight: 0.2,
            friction: 0.6,
            critical_velocity: 0.005,
            dt: 1.0,
            sample_tan: 4,
            sample_norm: 12,
        }
    }
}

/// Node-density and loop-cutting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyOptions {
    /// Target node spacing (px); sets the min/max neighbour distances.
    pub node_resolution: f64,
    /// Run `cut_loops` every this many evolver iterations.
    pub cut_every: usize,
    /// Run `correct_distance` every this many evolver iterations.
    pub correct_every: usize,
    /// Forward lookahead (edges) of the in-loop self-intersection scan.
    pub loop_window: usize,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            node_resolution: 6.0,
            cut_every: 8,
            correct_every: 10,
            loop_window: 12,
        }
    }
}

/// Settings for the expansion performed before evolving each frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionOptions {
    /// `true`: implode to a small seed and grow outward.
    /// `false`: loosen (blow up) and contract inward.
    pub expand_mode: bool,
    /// Total outward distance covered by `loosen`.
    pub blowup_amount: f64,
    /// Distance moved per loosen increment. Keep it at most half of
    /// `freeze_threshold` so neighbouring objects cannot pass through each
    /// other within one increment.
    pub loosen_step: f64,
    /// Centroid distance below which two objects are checked for contact.
    pub proximity_threshold: f64,
    /// Node-to-edge distance at which nodes of touching objects freeze.
    pub freeze_threshold: f64,
    /// Radius of the seed polygon created by `implode`.
    pub implode_radius: f64,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            expand_mode: false,
            blowup_amount: 20.0,
            loosen_step: 0.5,
            proximity_threshold: 150.0,
            freeze_threshold: 1.0,
            implode_radius: 5.0,
        }
    }
}

/// Per-frame schedule and failure policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    /// Upper bound on evolver iterations per object and frame.
    pub max_iterations: usize,
    /// Inward shrink applied to a converged contour before it is stored.
    pub final_shrink: f64,
    /// Step used while applying `final_shrink`.
    pub shrink_step: f64,
    /// Objects whose node count exceeds the seed count by this factor fail.
    pub max_node_growth_ratio: f64,
    /// Start each frame from the previous frame's result instead of the seed.
    pub use_previous_snake: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            max_iterations: 4000,
            final_shrink: 3.5,
            shrink_step: 1.0,
            max_node_growth_ratio: 10.0,
            use_previous_snake: true,
        }
    }
}

/// Engine-wide parameters, passed explicitly into every stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeParams {
    pub evolve: EvolveOptions,
    pub topology: TopologyOptions,
    pub expansion: ExpansionOptions,
    pub sequence: SequenceOptions,
}

impl SnakeParams {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let e = &self.evolve;
        if !(e.friction > 0.0 && e.friction <= 1.0) {
            return Err(OptionsError::Friction(e.friction));
        }
        positive("dt", e.dt)?;
        positive("critical_velocity", e.critical_velocity)?;
        positive("node_resolution", self.topology.node_resolution)?;
        positive("loosen_step", self.expansion.loosen_step)?;
        positive("implode_radius", self.expansion.implode_radius)?;
        positive("shrink_step", self.sequence.shrink_step)?;
        positive("max_node_growth_ratio", self.sequence.max_node_growth_ratio)?;
        nonzero("cut_every", self.topology.cut_every)?;
        nonzero("correct_every", self.topology.correct_every)?;
        nonzero("max_iterations", self.sequence.max_iterations)?;
        nonzero("sample_tan", e.sample_tan)?;
        if e.sample_norm < 2 {
            return Err(OptionsError::ZeroCount {
                name: "sample_norm / 2",
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), OptionsError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(OptionsError::NotPositive { name, value })
    }
}

fn nonzero(name: &'static str, value: usize) -> Result<(), OptionsError> {
    if value == 0 {
        Err(OptionsError::ZeroCount { name })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SnakeParams::default().validate(), Ok(()));
    }

    #[test]
    fn friction_outside_unit_interval_is_rejected() {
        let mut params = SnakeParams::default();
        params.evolve.friction = 0.0;
        assert_eq!(params.validate(), Err(OptionsError::Friction(0.0)));
        params.evolve.friction = 1.0;
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "topology": { "node_resolution": 3.0 }, "sequence": { "use_previous_snake": false } }"#;
        let params: SnakeParams = serde_json::from_str(json).expect("valid params");
        assert_eq!(params.topology.node_resolution, 3.0);
        assert_eq!(params.topology.cut_every, 8);
        assert!(!params.sequence.use_previous_snake);
        assert_eq!(params.evolve, EvolveOptions::default());
    }
}
