//! External post-processing applied to each converged contour.

use crate::error::PostProcessError;
use crate::geometry::Vec2;
use crate::types::ObjectId;

/// Transform applied to a finished polygon before it is stored as the
/// frame's final result. The engine never looks inside; on error the raw
/// (backup) polygon is kept.
pub trait PostProcess {
    fn apply(
        &self,
        polygon: &[Vec2],
        object: ObjectId,
        frame: usize,
    ) -> Result<Vec<Vec2>, PostProcessError>;
}

impl<F> PostProcess for F
where
    F: Fn(&[Vec2], ObjectId, usize) -> Result<Vec<Vec2>, PostProcessError>,
{
    fn apply(
        &self,
        polygon: &[Vec2],
        object: ObjectId,
        frame: usize,
    ) -> Result<Vec<Vec2>, PostProcessError> {
        self(polygon, object, frame)
    }
}

/// Keeps the polygon as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl PostProcess for Identity {
    fn apply(
        &self,
        polygon: &[Vec2],
        _object: ObjectId,
        _frame: usize,
    ) -> Result<Vec<Vec2>, PostProcessError> {
        Ok(polygon.to_vec())
    }
}
