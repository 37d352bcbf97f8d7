//! Perceptual quality (MOS) scoring.
//!
//! The model itself is a black box behind [`MosModel`]: construct one handle,
//! pass it to the scorer by reference and drop it when the run is over.

use std::path::Path;

pub mod command;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scorer;
pub mod timeout;

pub use command::CommandModel;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use scorer::{filter_by_quality, score_clip, score_speakers, ScoringSummary};
pub use timeout::TimeoutModel;

/// Predicts a mean opinion score for one 16 kHz mono WAV file.
pub trait MosModel {
    fn predict(&mut self, path: &Path) -> anyhow::Result<f32>;
}

impl<M: MosModel + ?Sized> MosModel for Box<M> {
    fn predict(&mut self, path: &Path) -> anyhow::Result<f32> {
        (**self).predict(path)
    }
}

impl<M: MosModel + ?Sized> MosModel for &mut M {
    fn predict(&mut self, path: &Path) -> anyhow::Result<f32> {
        (**self).predict(path)
    }
}
