use std::collections::HashMap;

use super::clip::Clip;

/// All clips recorded by one `client_id`, in parse order.
#[derive(Debug, Clone, PartialEq)]
pub struct Speaker {
    client_id: String,
    clips: Vec<Clip>,
    mos: Option<f32>,
}

impl Speaker {
    /// The aggregate MOS is derived from whatever clip scores are present.
    pub fn new(client_id: impl Into<String>, clips: Vec<Clip>) -> Self {
        let mos = mean_mos(&clips);
        Self {
            client_id: client_id.into(),
            clips,
            mos,
        }
    }

    /// Build a speaker whose clips have all been through the scorer.
    ///
    /// A speaker left without clips gets an aggregate of 0.
    pub fn scored(client_id: impl Into<String>, clips: Vec<Clip>) -> Self {
        let mos = Some(mean_mos(&clips).unwrap_or(0.0));
        Self {
            client_id: client_id.into(),
            clips,
            mos,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn mos(&self) -> Option<f32> {
        self.mos
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.clips.iter().map(Clip::duration_or_zero).sum()
    }

    pub fn into_parts(self) -> (String, Vec<Clip>) {
        (self.client_id, self.clips)
    }
}

/// Arithmetic mean over the clips that carry a score.
pub fn mean_mos(clips: &[Clip]) -> Option<f32> {
    let scores: Vec<f32> = clips.iter().filter_map(|c| c.mos).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f32>() / scores.len() as f32)
}

/// Group clips by `client_id`.
///
/// Speakers come out in order of first appearance and each keeps its clips
/// in encounter order, which the duration ceiling relies on.
pub fn group_by_speaker(clips: impl IntoIterator<Item = Clip>) -> Vec<Speaker> {
    let mut order: Vec<(String, Vec<Clip>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for clip in clips {
        match index.get(&clip.client_id) {
            Some(&i) => order[i].1.push(clip),
            None => {
                index.insert(clip.client_id.clone(), order.len());
                order.push((clip.client_id.clone(), vec![clip]));
            }
        }
    }
    order
        .into_iter()
        .map(|(client_id, clips)| Speaker::new(client_id, clips))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::clip;

    #[test]
    fn groups_in_encounter_order() {
        let clips = vec![
            clip("b", "1.wav", 10),
            clip("a", "2.wav", 20),
            clip("b", "3.wav", 30),
        ];
        let speakers = group_by_speaker(clips);
        assert_eq!(speakers.len(), 2);
        assert_eq!(speakers[0].client_id(), "b");
        let names: Vec<_> = speakers[0]
            .clips()
            .iter()
            .map(|c| c.file_name().into_owned())
            .collect();
        assert_eq!(names, ["1.wav", "3.wav"]);
        assert_eq!(speakers[0].total_duration_ms(), 40);
        assert!(speakers
            .iter()
            .all(|s| s.clips().iter().all(|c| c.client_id == s.client_id())));
    }

    #[test]
    fn mean_of_clip_scores() {
        let clips = vec![
            clip("a", "1.wav", 1).with_mos(2.0),
            clip("a", "2.wav", 1).with_mos(3.0),
            clip("a", "3.wav", 1).with_mos(4.0),
        ];
        let speaker = Speaker::new("a", clips);
        assert_eq!(speaker.mos(), Some(3.0));
    }

    #[test]
    fn unscored_speaker_has_no_aggregate() {
        assert_eq!(Speaker::new("a", vec![clip("a", "1.wav", 1)]).mos(), None);
        assert_eq!(Speaker::scored("a", Vec::new()).mos(), Some(0.0));
    }
}
