//! Grayscale frame types and the sampling interface the evolver reads.

pub mod f32;
pub mod frames;
pub mod io;
pub mod sampler;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::frames::{FrameSource, FrameStack};
pub use self::io::GrayImageU8;
pub use self::sampler::IntensitySampler;
pub use self::traits::ImageView;
pub use self::u8::ImageU8;
