//! Force-driven contour evolution.
//!
//! One [`Evolver::step`] integrates every unfrozen node of a contour once:
//!
//! - central force: constant pull along the inward normal,
//! - contraction: mean of the unit vectors toward both neighbours,
//! - image force: contrast between a window sampled inside the contour and one
//!   sampled outside, pushing outward when the inside is brighter.
//!
//! Forces are read for all nodes before any node moves, so the result does not
//! depend on visiting order. With the `parallel` feature the read phase runs
//! on the rayon pool.

use crate::contour::Contour;
use crate::geometry::{unit_or_zero, Vec2};
use crate::image::IntensitySampler;
use crate::options::EvolveOptions;
use crate::ring::NodeId;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which way the region term drives the contour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Drive {
    /// Shrink from outside onto the object boundary.
    #[default]
    Contracting,
    /// Grow from a small seed inside the object out to its boundary.
    Expanding,
}

impl Drive {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            Drive::Contracting => 1.0,
            Drive::Expanding => -1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Evolver {
    options: EvolveOptions,
    drive: Drive,
}

impl Evolver {
    pub fn new(options: EvolveOptions) -> Self {
        Self {
            options,
            drive: Drive::Contracting,
        }
    }

    pub fn with_drive(mut self, drive: Drive) -> Self {
        self.drive = drive;
        self
    }

    pub fn options(&self) -> &EvolveOptions {
        &self.options
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    /// Advance the contour one time step. Returns `true` once every node is
    /// frozen.
    pub fn step<S>(&self, contour: &mut Contour, image: &S) -> bool
    where
        S: IntensitySampler + ?Sized,
    {
        let active: Vec<NodeId> = contour
            .ids()
            .filter(|&id| !contour.node(id).is_frozen())
            .collect();
        if active.is_empty() {
            return contour.all_frozen();
        }

        let forces = self.read_forces(contour, &active, image);

        let dt = self.options.dt;
        let mut stopped = Vec::new();
        for (&id, force) in active.iter().zip(forces) {
            let node = contour.node_mut(id);
            node.velocity += force * dt;
            node.pending = node.pos + node.velocity * dt;
            node.velocity *= self.options.friction;
            if node.velocity.norm() < self.options.critical_velocity {
                stopped.push(id);
            }
        }
        for id in stopped {
            contour.freeze(id);
        }
        for &id in &active {
            let node = contour.node_mut(id);
            node.pos = node.pending;
        }
        contour.update_normals();
        contour.all_frozen()
    }

    fn read_forces<S>(&self, contour: &Contour, active: &[NodeId], image: &S) -> Vec<Vec2>
    where
        S: IntensitySampler + ?Sized,
    {
        #[cfg(feature = "parallel")]
        {
            active
                .par_iter()
                .map(|&id| self.node_force(contour, id, image))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            active
                .iter()
                .map(|&id| self.node_force(contour, id, image))
                .collect()
        }
    }

    /// Total force acting on one node.
    pub fn node_force<S>(&self, contour: &Contour, id: NodeId, image: &S) -> Vec2
    where
        S: IntensitySampler + ?Sized,
    {
        let o = &self.options;
        let node = contour.node(id);
        let prev = contour.node(contour.prev(id)).pos;
        let next = contour.node(contour.next(id)).pos;
        let sign = self.drive.sign();

        let central = node.normal * (o.central_weight * sign);
        let contraction =
            (unit_or_zero(prev - node.pos) + unit_or_zero(next - node.pos)) * (0.5 * o.contraction_weight);
        let region = image_force(node.pos, node.normal, node.tangent, o, image) * sign;
        central + contraction + region
    }
}

/// Contrast force at `pos` for a contracting contour.
///
/// Averages a `sample_tan` × `sample_norm / 2` pixel window on the inner side
/// (along `normal`) and one on the outer side. When the inside is brighter the
/// force points outward with magnitude `image_weight × √contrast`, contrast
/// being the mean difference on the 0–1 scale. Pixels outside the frame are
/// left out of the means; an empty window gives no force.
pub fn image_force<S>(pos: Vec2, normal: Vec2, tangent: Vec2, options: &EvolveOptions, image: &S) -> Vec2
where
    S: IntensitySampler + ?Sized,
{
    let depth = options.sample_norm / 2;
    let half_width = (options.sample_tan as f64 - 1.0) / 2.0;
    let mut inside = WindowMean::default();
    let mut outside = WindowMean::default();
    for i in 0..options.sample_tan {
        let across = pos + tangent * (i as f64 - half_width);
        for d in 1..=depth {
            let offset = normal * d as f64;
            inside.add(image, across + offset);
            outside.add(image, across - offset);
        }
    }
    let (Some(mean_in), Some(mean_out)) = (inside.mean(), outside.mean()) else {
        return Vec2::zeros();
    };
    let contrast = (mean_in - mean_out) / 255.0;
    if contrast > 0.0 {
        -normal * (options.image_weight * contrast.sqrt())
    } else {
        Vec2::zeros()
    }
}

#[derive(Default)]
struct WindowMean {
    sum: f64,
    count: usize,
}

impl WindowMean {
    fn add<S: IntensitySampler + ?Sized>(&mut self, image: &S, p: Vec2) {
        if let Some(v) = image.sample(p.x.round() as i64, p.y.round() as i64) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::regular_polygon;
    use crate::image::GrayImageU8;
    use crate::types::ObjectId;

    fn half_plane(w: usize, h: usize, split: usize) -> GrayImageU8 {
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..split {
                data[y * w + x] = 200;
            }
        }
        GrayImageU8::new(w, h, data)
    }

    #[test]
    fn image_force_pushes_outward_when_inside_is_brighter() {
        let img = half_plane(100, 100, 50);
        let opts = EvolveOptions::default();
        let f = image_force(
            Vec2::new(52.0, 50.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            &opts,
            &img,
        );
        // Four of six depths land on the bright side.
        let contrast: f64 = 200.0 * 4.0 / 6.0 / 255.0;
        assert!((f.x - opts.image_weight * contrast.sqrt()).abs() < 1e-12);
        assert!(f.y.abs() < 1e-12);

        let reversed = image_force(
            Vec2::new(48.0, 50.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            &opts,
            &img,
        );
        assert_eq!(reversed, Vec2::zeros());
    }

    #[test]
    fn empty_outside_window_gives_no_force() {
        let img = half_plane(100, 100, 50);
        let f = image_force(
            Vec2::new(0.0, 50.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            &EvolveOptions::default(),
            &img,
        );
        assert_eq!(f, Vec2::zeros());
    }

    #[test]
    fn blank_frame_contracts_and_expanding_drive_grows() {
        let img = GrayImageU8::new(100, 100, vec![0; 100 * 100]);
        let center = Vec2::new(50.0, 50.0);
        let pts = regular_polygon(center, 10.0, 16);

        let mut shrinking = Contour::from_points(ObjectId(1), &pts).expect("contour");
        Evolver::new(EvolveOptions::default()).step(&mut shrinking, &img);
        assert!(shrinking.positions().iter().all(|p| (p - center).norm() < 10.0));

        let mut growing = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let evolver = Evolver::new(EvolveOptions::default()).with_drive(Drive::Expanding);
        evolver.step(&mut growing, &img);
        assert!(growing.positions().iter().all(|p| (p - center).norm() > 10.0));
    }

    #[test]
    fn frozen_nodes_do_not_move() {
        let img = GrayImageU8::new(100, 100, vec![0; 100 * 100]);
        let pts = regular_polygon(Vec2::new(50.0, 50.0), 10.0, 8);
        let mut contour = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let pinned = contour.head();
        let before = contour.node(pinned).pos;
        contour.freeze(pinned);
        Evolver::new(EvolveOptions::default()).step(&mut contour, &img);
        assert_eq!(contour.node(pinned).pos, before);
        assert!(contour.node(pinned).is_frozen());
    }

    #[test]
    fn slow_nodes_freeze() {
        let img = GrayImageU8::new(100, 100, vec![0; 100 * 100]);
        let pts = regular_polygon(Vec2::new(50.0, 50.0), 10.0, 8);
        let mut contour = Contour::from_points(ObjectId(1), &pts).expect("contour");
        let opts = EvolveOptions {
            central_weight: 0.0,
            contraction_weight: 0.0,
            ..EvolveOptions::default()
        };
        assert!(Evolver::new(opts).step(&mut contour, &img));
        assert_eq!(contour.frozen_count(), 8);
    }
}
