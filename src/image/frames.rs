//! Frame lookup by frame number.

use super::IntensitySampler;

/// Supplies the frame image for a frame number.
pub trait FrameSource: Sync {
    type Image: IntensitySampler;

    fn frame(&self, index: usize) -> Option<&Self::Image>;
}

/// In-memory stack of consecutive frames starting at `first_frame`.
#[derive(Clone, Debug)]
pub struct FrameStack<I> {
    pub first_frame: usize,
    pub frames: Vec<I>,
}

impl<I> FrameStack<I> {
    pub fn new(first_frame: usize, frames: Vec<I>) -> Self {
        Self {
            first_frame,
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<I: IntensitySampler> FrameSource for FrameStack<I> {
    type Image = I;

    fn frame(&self, index: usize) -> Option<&I> {
        index
            .checked_sub(self.first_frame)
            .and_then(|i| self.frames.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImageU8;

    #[test]
    fn frames_are_addressed_from_first_frame() {
        let frames = (0..3)
            .map(|i| GrayImageU8::new(1, 1, vec![i as u8]))
            .collect();
        let stack = FrameStack::new(5, frames);
        assert!(stack.frame(4).is_none());
        assert_eq!(stack.frame(6).and_then(|f| f.sample(0, 0)), Some(1.0));
        assert!(stack.frame(7).is_some());
        assert!(stack.frame(8).is_none());
    }
}
