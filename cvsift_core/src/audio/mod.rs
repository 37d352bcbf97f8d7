//! Audio normalization: decoding, resampling to the canonical rate and
//! silence trimming.

pub mod decoder;
pub mod normalize;
pub mod silence;
pub mod wav;

pub use normalize::{resample, resampled_path, trim_silence};
pub use silence::SilenceDetector;
