//! Duration-based admission of clips and speakers.

use tracing::debug;

use crate::config::FilterConfig;
use crate::error::Result;
use crate::model::{ClipSet, Speaker};

/// Drop clips longer than `max_clip_ms`. A clip exactly at the limit stays,
/// and so does a clip with no known duration.
pub fn filter_clips(clips: ClipSet, config: &FilterConfig) -> Result<ClipSet> {
    clips.filter(|clip| clip.duration_ms.is_none_or(|d| d <= config.max_clip_ms))
}

/// Admit speakers with strictly more than `min_speaker_ms` of audio, then cap
/// each survivor at `max_speaker_ms`.
pub fn filter_speakers(speakers: Vec<Speaker>, config: &FilterConfig) -> Vec<Speaker> {
    speakers
        .into_iter()
        .filter(|speaker| {
            let total = speaker.total_duration_ms();
            let keep = total > config.min_speaker_ms;
            if !keep {
                debug!(client_id = speaker.client_id(), total, "speaker below minimum duration");
            }
            keep
        })
        .map(|speaker| truncate_speaker(speaker, config.max_speaker_ms))
        .collect()
}

/// Keep the longest prefix of the speaker's clips whose cumulative duration
/// stays within `ceiling_ms`. The clip that would cross the ceiling is
/// dropped along with everything after it.
pub fn truncate_speaker(speaker: Speaker, ceiling_ms: u64) -> Speaker {
    let mut total = 0u64;
    let cut = speaker.clips().iter().position(|clip| {
        total += clip.duration_or_zero();
        total > ceiling_ms
    });
    match cut {
        None => speaker,
        Some(index) => {
            debug!(
                client_id = speaker.client_id(),
                kept = index,
                dropped = speaker.clips().len() - index,
                "speaker truncated at duration ceiling"
            );
            let (client_id, mut clips) = speaker.into_parts();
            clips.truncate(index);
            Speaker::new(client_id, clips)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::test_support::clip;
    use crate::model::{group_by_speaker, Clip};

    fn set(clips: Vec<Clip>) -> ClipSet {
        let mut set = ClipSet::new(Some(PathBuf::from("/clips")));
        for c in clips {
            set.insert(c).unwrap();
        }
        set
    }

    fn speaker(durations: &[u64]) -> Speaker {
        let clips = durations
            .iter()
            .enumerate()
            .map(|(i, d)| clip("spk", &format!("{i}.wav"), *d))
            .collect();
        Speaker::new("spk", clips)
    }

    fn durations(speaker: &Speaker) -> Vec<u64> {
        speaker.clips().iter().map(|c| c.duration_or_zero()).collect()
    }

    #[test]
    fn clip_limit_is_inclusive() {
        let config = FilterConfig::default();
        let mut unknown = clip("a", "3.wav", 0);
        unknown.duration_ms = None;
        let clips = set(vec![
            clip("a", "1.wav", 16_700),
            clip("a", "2.wav", 16_701),
            unknown,
        ]);
        let kept = filter_clips(clips, &config).unwrap();
        let names: Vec<_> = kept.iter().map(|c| c.file_name().into_owned()).collect();
        assert_eq!(names, ["1.wav", "3.wav"]);
        assert!(kept.iter().all(|c| c.duration_or_zero() <= 16_700));
    }

    #[test]
    fn speaker_minimum_is_strict() {
        let config = FilterConfig::default();
        let speakers = group_by_speaker(vec![
            clip("exact", "1.wav", 600_000),
            clip("exact", "2.wav", 600_000),
            clip("over", "3.wav", 1_200_001),
        ]);
        let kept = filter_speakers(speakers, &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].client_id(), "over");
    }

    #[test]
    fn truncates_at_first_clip_over_ceiling() {
        let config = FilterConfig::default();
        let kept = filter_speakers(vec![speaker(&[20_000_000, 10_000_000, 10_000_000])], &config);
        assert_eq!(durations(&kept[0]), [20_000_000, 10_000_000]);
    }

    #[test]
    fn later_short_clips_are_not_readmitted() {
        let truncated = truncate_speaker(speaker(&[30, 50, 5]), 60);
        assert_eq!(durations(&truncated), [30]);
    }

    #[test]
    fn speaker_under_ceiling_is_untouched() {
        let original = speaker(&[10, 20, 30]);
        assert_eq!(truncate_speaker(original.clone(), 60), original);
    }

    #[test]
    fn truncation_is_idempotent() {
        let config = FilterConfig::default();
        let once = filter_speakers(
            vec![speaker(&[20_000_000, 10_000_000, 10_000_000, 1_000])],
            &config,
        );
        let twice = filter_speakers(once.clone(), &config);
        assert_eq!(once, twice);
    }
}
