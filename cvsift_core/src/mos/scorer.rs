use tracing::{debug, error, warn};

use super::MosModel;
use crate::error::{Result, SiftError};
use crate::model::{Clip, Speaker};

/// Counts gathered while scoring a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringSummary {
    pub scored: usize,
    pub failed: usize,
}

/// Score one clip's audio file and store the result on the clip.
///
/// Negative scores are kept but logged; model failures and non-finite
/// predictions become [`SiftError::Scoring`].
pub fn score_clip<M: MosModel + ?Sized>(model: &mut M, clip: Clip) -> Result<Clip> {
    let mos = model.predict(&clip.path).map_err(|e| SiftError::Scoring {
        path: clip.path.clone(),
        reason: format!("{e:#}"),
    })?;
    if !mos.is_finite() {
        return Err(SiftError::Scoring {
            path: clip.path.clone(),
            reason: format!("model returned {mos}"),
        });
    }
    if mos < 0.0 {
        warn!(
            path = %clip.path.display(),
            mos,
            "negative MOS, you may want to check the audio file"
        );
    }
    debug!(path = %clip.path.display(), mos, "scored clip");
    Ok(clip.with_mos(mos))
}

/// Score every clip of every speaker.
///
/// A clip the model fails on is dropped from its speaker and scoring moves
/// on to the next clip. Each speaker's aggregate is the mean over its
/// remaining clips; speakers left empty get 0 and are kept for the caller's
/// admission step to drop.
pub fn score_speakers<M: MosModel + ?Sized>(
    model: &mut M,
    speakers: Vec<Speaker>,
) -> (Vec<Speaker>, ScoringSummary) {
    let mut summary = ScoringSummary::default();
    let scored = speakers
        .into_iter()
        .map(|speaker| {
            let (client_id, clips) = speaker.into_parts();
            let mut kept = Vec::with_capacity(clips.len());
            for clip in clips {
                match score_clip(&mut *model, clip) {
                    Ok(clip) => {
                        summary.scored += 1;
                        kept.push(clip);
                    }
                    Err(e) => {
                        summary.failed += 1;
                        error!(client_id = %client_id, "{e}");
                    }
                }
            }
            let speaker = Speaker::scored(client_id, kept);
            debug!(
                client_id = speaker.client_id(),
                clips = speaker.clips().len(),
                mos = speaker.mos().unwrap_or_default(),
                "scored speaker"
            );
            speaker
        })
        .collect();
    (scored, summary)
}

/// Keep speakers whose aggregate MOS is at least `threshold`.
///
/// Unscored and empty speakers never pass.
pub fn filter_by_quality(speakers: Vec<Speaker>, threshold: f32) -> Vec<Speaker> {
    speakers
        .into_iter()
        .filter(|s| !s.is_empty() && s.mos().is_some_and(|mos| mos >= threshold))
        .collect()
}
