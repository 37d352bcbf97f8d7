//! Leading and trailing silence detection.

use std::ops::Range;

/// Silence detection configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceDetector {
    /// Chunks whose RMS level is below this are silent (default: -50.0 dBFS)
    pub threshold_dbfs: f32,

    /// Analysis granularity in milliseconds (default: 1)
    pub chunk_ms: u32,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            threshold_dbfs: crate::config::SILENCE_THRESHOLD_DBFS,
            chunk_ms: 1,
        }
    }
}

/// RMS level of a chunk relative to full scale. Digital silence is -inf.
pub fn dbfs(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return f32::NEG_INFINITY;
    }
    let mean_square = chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32;
    10.0 * mean_square.log10()
}

impl SilenceDetector {
    fn chunk_len(&self, sample_rate: u32) -> usize {
        ((sample_rate as u64 * self.chunk_ms as u64 / 1000) as usize).max(1)
    }

    fn is_silent(&self, chunk: &[f32]) -> bool {
        dbfs(chunk) < self.threshold_dbfs
    }

    /// Number of samples of leading silence, whole chunks at a time.
    pub fn leading(&self, samples: &[f32], sample_rate: u32) -> usize {
        let silent = samples
            .chunks(self.chunk_len(sample_rate))
            .take_while(|chunk| self.is_silent(chunk))
            .map(<[f32]>::len)
            .sum::<usize>();
        silent.min(samples.len())
    }

    /// Number of samples of trailing silence, whole chunks at a time.
    pub fn trailing(&self, samples: &[f32], sample_rate: u32) -> usize {
        let silent = samples
            .rchunks(self.chunk_len(sample_rate))
            .take_while(|chunk| self.is_silent(chunk))
            .map(<[f32]>::len)
            .sum::<usize>();
        silent.min(samples.len())
    }

    /// Range of `samples` left after removing leading and trailing silence.
    ///
    /// Audio that is silent throughout yields an empty range.
    pub fn voiced_range(&self, samples: &[f32], sample_rate: u32) -> Range<usize> {
        let start = self.leading(samples, sample_rate);
        if start == samples.len() {
            return start..start;
        }
        let end = samples.len() - self.trailing(samples, sample_rate);
        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn loud(n: usize) -> Vec<f32> {
        (0..n).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect()
    }

    #[test]
    fn dbfs_of_full_scale_square_is_zero() {
        assert!(dbfs(&[1.0, -1.0, 1.0, -1.0]).abs() < 1e-4);
        assert_eq!(dbfs(&[0.0; 16]), f32::NEG_INFINITY);
    }

    #[test]
    fn trims_both_ends() {
        let mut samples = vec![0.0; 160];
        samples.extend(loud(320));
        samples.extend(vec![0.0; 48]);
        let range = SilenceDetector::default().voiced_range(&samples, RATE);
        assert_eq!(range, 160..480);
    }

    #[test]
    fn quiet_noise_below_threshold_is_silence() {
        // -60 dBFS
        let mut samples = vec![0.001; 64];
        samples.extend(loud(64));
        let range = SilenceDetector::default().voiced_range(&samples, RATE);
        assert_eq!(range.start, 64);
    }

    #[test]
    fn no_silence_keeps_everything() {
        let samples = loud(100);
        assert_eq!(SilenceDetector::default().voiced_range(&samples, RATE), 0..100);
    }

    #[test]
    fn all_silent_is_empty() {
        let samples = vec![0.0; 1000];
        let range = SilenceDetector::default().voiced_range(&samples, RATE);
        assert!(range.is_empty());
        assert!(SilenceDetector::default().voiced_range(&[], RATE).is_empty());
    }
}
