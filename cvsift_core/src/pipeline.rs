//! The filtering pipeline, stage by stage.
//!
//! Every stage consumes the full output of the previous one:
//! parse -> durations -> clip filter -> resample -> trim -> group ->
//! speaker filter -> score -> quality filter.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::audio::{resample, resampled_path, trim_silence, SilenceDetector};
use crate::config::FilterConfig;
use crate::duration::{filter_clips, filter_speakers};
use crate::error::{Result, SiftError};
use crate::model::{
    add_durations, group_by_speaker, parse_clips, Clip, DurationRecord, MetadataRecord, Speaker,
};
use crate::mos::{filter_by_quality, score_speakers, MosModel};

/// Counts after each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub clips_parsed: usize,
    pub clips_within_duration: usize,
    pub clips_unreadable: usize,
    /// Clips whose resampled file had already been written for another
    /// source with the same stem.
    pub clips_sharing_output: usize,
    pub speakers_found: usize,
    pub speakers_within_duration: usize,
    pub clips_scored: usize,
    pub clips_failed_scoring: usize,
    pub speakers_accepted: usize,
    pub clips_accepted: usize,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clips: {} parsed, {} within duration, {} unreadable, {} sharing output, {} scored, \
             {} failed scoring, {} accepted; speakers: {} found, {} within duration, {} accepted",
            self.clips_parsed,
            self.clips_within_duration,
            self.clips_unreadable,
            self.clips_sharing_output,
            self.clips_scored,
            self.clips_failed_scoring,
            self.clips_accepted,
            self.speakers_found,
            self.speakers_within_duration,
            self.speakers_accepted,
        )
    }
}

/// Surviving speakers, in order of first appearance, and the run's counts.
#[derive(Debug)]
pub struct PipelineOutput {
    pub speakers: Vec<Speaker>,
    pub report: PipelineReport,
}

impl PipelineOutput {
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.speakers.iter().flat_map(|s| s.clips().iter())
    }
}

pub struct Pipeline {
    config: FilterConfig,
    clip_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            clip_dir: None,
        }
    }

    /// Write normalized audio here instead of next to the source files.
    pub fn with_output_clip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clip_dir = Some(dir.into());
        self
    }

    /// Run every stage over the corpus.
    ///
    /// `audio_root` is the directory the metadata `path` column is relative to.
    pub fn run<M: MosModel + ?Sized>(
        &self,
        model: &mut M,
        metadata: &[MetadataRecord],
        durations: &[DurationRecord],
        audio_root: &Path,
    ) -> Result<PipelineOutput> {
        let mut report = PipelineReport::default();

        let clips = parse_clips(metadata, Some(audio_root))?;
        report.clips_parsed = clips.len();
        info!("Clips parsed, found {} clips", clips.len());

        let clips = add_durations(durations, clips)?;
        info!("Durations added");

        let clips = filter_clips(clips, &self.config)?;
        report.clips_within_duration = clips.len();
        info!("Clips filtered, {} clips remaining", clips.len());

        info!("Resampling clips to {} Hz", self.config.sample_rate);
        let mut claimed = HashSet::new();
        let mut shared = 0;
        let (clips, unreadable) = self.normalize_each(clips.into_clips(), |clip| {
            let target = resampled_path(&clip.path, self.clip_dir.as_deref());
            if !claimed.insert(target.clone()) {
                warn!(
                    source = %clip.path.display(),
                    target = %target.display(),
                    "resampled file already written for another clip, overwriting"
                );
                shared += 1;
            }
            resample(&clip, self.clip_dir.as_deref(), self.config.sample_rate)
        })?;
        report.clips_unreadable += unreadable;
        report.clips_sharing_output = shared;

        info!("Removing silence from clips");
        let detector = SilenceDetector {
            threshold_dbfs: self.config.silence_threshold_dbfs,
            chunk_ms: self.config.silence_chunk_ms,
        };
        let (clips, unreadable) =
            self.normalize_each(clips, |clip| trim_silence(clip, &detector))?;
        report.clips_unreadable += unreadable;

        let speakers = group_by_speaker(clips);
        report.speakers_found = speakers.len();
        info!("Found {} speakers", speakers.len());

        let speakers = filter_speakers(speakers, &self.config);
        report.speakers_within_duration = speakers.len();
        info!("Filtered to {} speakers", speakers.len());

        info!("Obtaining MOS for speakers");
        let (speakers, summary) = score_speakers(model, speakers);
        report.clips_scored = summary.scored;
        report.clips_failed_scoring = summary.failed;

        let speakers = filter_by_quality(speakers, self.config.mos_threshold);
        report.speakers_accepted = speakers.len();
        report.clips_accepted = speakers.iter().map(|s| s.clips().len()).sum();
        info!(
            "Filtered to {} speakers based on MOS (threshold {})",
            speakers.len(),
            self.config.mos_threshold
        );

        Ok(PipelineOutput { speakers, report })
    }

    /// Apply one audio stage to every clip. Audio failures abort the run
    /// unless `skip_unreadable_audio` is set, in which case the clip is
    /// dropped and counted.
    fn normalize_each(
        &self,
        clips: Vec<Clip>,
        mut stage: impl FnMut(Clip) -> Result<Clip>,
    ) -> Result<(Vec<Clip>, usize)> {
        let mut out = Vec::with_capacity(clips.len());
        let mut dropped = 0;
        for clip in clips {
            match stage(clip) {
                Ok(clip) => out.push(clip),
                Err(e @ SiftError::Audio { .. }) if self.config.skip_unreadable_audio => {
                    error!("{:#}, dropping clip", anyhow::Error::from(e));
                    dropped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((out, dropped))
    }
}
