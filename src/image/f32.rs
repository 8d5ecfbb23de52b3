//! Owned single-channel f32 frame, row-major and tightly packed.
//!
//! Intensities are expected in [0, 1]; samplers scale them back to the 8-bit
//! range so contrast thresholds mean the same for every frame type.

use super::ImageView;

#[derive(Clone, Debug)]
pub struct ImageF32 {
    pub w: usize,
    pub h: usize,
    /// `w * h` values, row by row.
    pub data: Vec<f32>,
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}
