//! Selection thresholds and normalization parameters.

use std::time::Duration;

use serde::Deserialize;

/// Longest admissible clip, 16.7 s.
pub const MAX_CLIP_DURATION_MS: u64 = 16_700;
/// A speaker needs strictly more than 20 minutes of audio.
pub const MIN_SPEAKER_DURATION_MS: u64 = 1_200_000;
/// A speaker contributes at most 10 hours of audio.
pub const MAX_SPEAKER_DURATION_MS: u64 = 36_000_000;
/// Canonical sample rate every clip is resampled to.
pub const SAMPLE_RATE: u32 = 16_000;
/// Amplitude below which a chunk counts as silence.
pub const SILENCE_THRESHOLD_DBFS: f32 = -50.0;
pub const DEFAULT_MOS_THRESHOLD: f32 = 3.0;

/// Pipeline configuration.
///
/// Every field has a default matching the published selection criteria, so a
/// TOML file only needs to list the values it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Clips longer than this are dropped (strict greater-than).
    pub max_clip_ms: u64,

    /// Speakers whose total is not strictly above this are dropped.
    pub min_speaker_ms: u64,

    /// Cumulative ceiling per speaker; later clips are truncated away.
    pub max_speaker_ms: u64,

    /// Target sample rate in Hz (default: 16000)
    pub sample_rate: u32,

    /// Silence threshold in dBFS (default: -50.0)
    pub silence_threshold_dbfs: f32,

    /// Silence detection granularity in milliseconds (default: 1)
    pub silence_chunk_ms: u32,

    /// Minimum mean MOS for a speaker, inclusive.
    pub mos_threshold: f32,

    /// Per-file limit for the quality model. `None` waits forever.
    pub scorer_timeout_secs: Option<u64>,

    /// Drop clips whose audio cannot be decoded instead of aborting the run.
    pub skip_unreadable_audio: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_clip_ms: MAX_CLIP_DURATION_MS,
            min_speaker_ms: MIN_SPEAKER_DURATION_MS,
            max_speaker_ms: MAX_SPEAKER_DURATION_MS,
            sample_rate: SAMPLE_RATE,
            silence_threshold_dbfs: SILENCE_THRESHOLD_DBFS,
            silence_chunk_ms: 1,
            mos_threshold: DEFAULT_MOS_THRESHOLD,
            scorer_timeout_secs: None,
            skip_unreadable_audio: false,
        }
    }
}

impl FilterConfig {
    pub fn scorer_timeout(&self) -> Option<Duration> {
        self.scorer_timeout_secs.map(Duration::from_secs)
    }
}
