use std::path::{Path, PathBuf};

use tracing::debug;

use super::decoder::decode_resampled;
use super::silence::SilenceDetector;
use super::wav::{duration_ms, read_wav, write_wav};
use crate::error::{Result, SiftError};
use crate::model::Clip;

pub const CANONICAL_EXTENSION: &str = "wav";

/// Where the resampled copy of `source` is written.
pub fn resampled_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let target = match (output_dir, source.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => source.to_path_buf(),
    };
    target.with_extension(CANONICAL_EXTENSION)
}

/// Decode the clip's audio, resample it to `sample_rate` mono and write it as
/// WAV, either under `output_dir` or next to the source.
///
/// The returned clip points at the new file; `clip` itself is untouched.
pub fn resample(clip: &Clip, output_dir: Option<&Path>, sample_rate: u32) -> Result<Clip> {
    let target = resampled_path(&clip.path, output_dir);
    let samples = decode_resampled(&clip.path, sample_rate)
        .map_err(|e| SiftError::audio(&clip.path, e))?;
    write_wav(&target, &samples, sample_rate).map_err(|e| SiftError::audio(&target, e))?;
    debug!(
        source = %clip.path.display(),
        target = %target.display(),
        samples = samples.len(),
        "resampled clip"
    );
    Ok(clip.clone().with_path(target))
}

/// Strip leading and trailing silence from the clip's WAV file, overwriting
/// it, and return the clip with its duration set to the trimmed length.
///
/// A clip that is silent throughout ends up empty with a duration of 0.
pub fn trim_silence(clip: Clip, detector: &SilenceDetector) -> Result<Clip> {
    let (samples, sample_rate) =
        read_wav(&clip.path).map_err(|e| SiftError::audio(&clip.path, e))?;
    let range = detector.voiced_range(&samples, sample_rate);
    let trimmed = &samples[range];
    write_wav(&clip.path, trimmed, sample_rate).map_err(|e| SiftError::audio(&clip.path, e))?;

    let trimmed_ms = duration_ms(trimmed.len(), sample_rate);
    debug!(
        path = %clip.path.display(),
        before_ms = duration_ms(samples.len(), sample_rate),
        after_ms = trimmed_ms,
        "trimmed silence"
    );
    Ok(clip.with_duration(trimmed_ms))
}
