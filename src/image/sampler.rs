//! Pixel intensity access for the image force.
//!
//! Samplers report intensities on the 8-bit scale (0–255) regardless of the
//! underlying storage, and bounds-check integer coordinates so callers can
//! probe past the frame edge.

use super::{GrayImageU8, ImageF32, ImageU8, ImageView};

pub trait IntensitySampler: Sync {
    /// Frame size as `(width, height)`.
    fn dimensions(&self) -> (usize, usize);

    /// Intensity at an in-bounds pixel.
    fn intensity(&self, x: usize, y: usize) -> f64;

    #[inline]
    fn contains(&self, x: i64, y: i64) -> bool {
        let (w, h) = self.dimensions();
        x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h
    }

    /// Intensity at `(x, y)`, or `None` outside the frame.
    #[inline]
    fn sample(&self, x: i64, y: i64) -> Option<f64> {
        self.contains(x, y)
            .then(|| self.intensity(x as usize, y as usize))
    }
}

impl IntensitySampler for ImageU8<'_> {
    #[inline]
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    #[inline]
    fn intensity(&self, x: usize, y: usize) -> f64 {
        self.pixel(x, y) as f64
    }
}

impl IntensitySampler for GrayImageU8 {
    #[inline]
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    #[inline]
    fn intensity(&self, x: usize, y: usize) -> f64 {
        self.as_view().pixel(x, y) as f64
    }
}

impl IntensitySampler for ImageF32 {
    #[inline]
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    #[inline]
    fn intensity(&self, x: usize, y: usize) -> f64 {
        self.pixel(x, y) as f64 * 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_samples_are_none() {
        let img = GrayImageU8::new(3, 2, vec![0, 10, 20, 30, 40, 50]);
        assert_eq!(img.sample(1, 1), Some(40.0));
        assert_eq!(img.sample(-1, 0), None);
        assert_eq!(img.sample(3, 0), None);
        assert_eq!(img.sample(0, 2), None);
    }

    #[test]
    fn float_frames_use_the_eight_bit_scale() {
        let img = ImageF32 {
            w: 2,
            h: 1,
            data: vec![0.0, 1.0],
        };
        assert_eq!(img.sample(0, 0), Some(0.0));
        assert_eq!(img.sample(1, 0), Some(255.0));
        assert_eq!(img.sample(2, 0), None);
    }

    #[test]
    fn strided_views_skip_padding() {
        let data = [1u8, 2, 99, 3, 4, 99];
        let view = ImageU8 {
            w: 2,
            h: 2,
            stride: 3,
            data: &data,
        };
        assert_eq!(view.sample(0, 1), Some(3.0));
        assert_eq!(view.sample(1, 1), Some(4.0));
        assert_eq!(view.sample(2, 0), None);
    }
}
