//! In-process scoring with an ONNX export of a wav2vec2 MOS regressor.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ort::session::Session;
use ort::value::Tensor;

use super::MosModel;
use crate::audio::decoder::{resample_mono, MonoPcm};
use crate::audio::wav::read_wav;
use crate::config::SAMPLE_RATE;

/// A loaded MOS model. The session lives as long as this handle.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxModel {
    /// Load the model from an `.onnx` file.
    ///
    /// The first graph input must take a `[batch, samples]` f32 waveform and
    /// the first output must hold the predicted score.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let session = Session::builder()?
            .with_intra_threads(4)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load MOS model {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| anyhow!("MOS model has no inputs"))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("MOS model has no outputs"))?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

/// Zero mean, unit variance, as wav2vec2 feature extractors expect.
fn standardize(samples: &mut [f32]) {
    let n = samples.len() as f32;
    let mean = samples.iter().sum::<f32>() / n;
    let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    let std = (var + 1e-7).sqrt();
    for s in samples.iter_mut() {
        *s = (*s - mean) / std;
    }
}

impl MosModel for OnnxModel {
    fn predict(&mut self, path: &Path) -> Result<f32> {
        let (samples, sample_rate) = read_wav(path)?;
        let mut samples = if sample_rate == SAMPLE_RATE {
            samples
        } else {
            resample_mono(&MonoPcm { samples, sample_rate }, SAMPLE_RATE)?
        };
        if samples.is_empty() {
            bail!("no audio to score");
        }
        standardize(&mut samples);

        let input = Tensor::from_array(([1usize, samples.len()], samples))?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;
        let (_, scores) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("failed to extract score: {e}"))?;
        scores
            .first()
            .copied()
            .ok_or_else(|| anyhow!("MOS model returned an empty tensor"))
    }
}
