use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::record::{DurationRecord, MetadataRecord};
use crate::error::{Result, SiftError};

/// One recorded utterance and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Audio file backing the clip.
    pub path: PathBuf,
    /// `None` until a duration is attached or measured.
    pub duration_ms: Option<u64>,
    pub client_id: String,
    pub sentence_id: String,
    pub sentence: String,
    pub sentence_domain: String,
    pub up_votes: u32,
    pub down_votes: u32,
    pub age: String,
    pub gender: String,
    pub accents: String,
    pub variant: String,
    pub locale: String,
    pub segment: String,
    /// `None` until the quality model has scored the clip.
    pub mos: Option<f32>,
}

impl Clip {
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }

    pub fn with_path(self, path: PathBuf) -> Self {
        Self { path, ..self }
    }

    pub fn with_duration(self, duration_ms: u64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..self
        }
    }

    pub fn with_mos(self, mos: f32) -> Self {
        Self {
            mos: Some(mos),
            ..self
        }
    }

    /// Duration used for admission sums; unset counts as zero.
    pub fn duration_or_zero(&self) -> u64 {
        self.duration_ms.unwrap_or(0)
    }

    /// Output row: `path` loses its directory, duration is appended.
    pub fn to_record(&self) -> MetadataRecord {
        MetadataRecord {
            line: 0,
            client_id: self.client_id.clone(),
            path: self.file_name().into_owned(),
            sentence_id: self.sentence_id.clone(),
            sentence: self.sentence.clone(),
            sentence_domain: self.sentence_domain.clone(),
            up_votes: self.up_votes.to_string(),
            down_votes: self.down_votes.to_string(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            accents: self.accents.clone(),
            variant: self.variant.clone(),
            locale: self.locale.clone(),
            segment: self.segment.clone(),
            duration_ms: Some(self.duration_ms.map(|d| d.to_string()).unwrap_or_default()),
        }
    }

    pub fn to_tsv_train(&self) -> String {
        self.to_record().to_string()
    }

    /// The `clip_durations.tsv` row: file name and duration.
    pub fn duration_fields(&self) -> [String; 2] {
        [
            self.file_name().into_owned(),
            self.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
        ]
    }

    pub fn to_tsv_duration(&self) -> String {
        self.duration_fields().join("\t")
    }
}

fn parse_votes(record: &MetadataRecord, name: &str, value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|e| {
        SiftError::malformed(record.line, format!("invalid {name} {value:?}: {e}"))
    })
}

/// Interpret a metadata record, resolving its file against `audio_root`.
///
/// The duration always starts unset, even when the record carries one.
pub fn parse_clip(record: &MetadataRecord, audio_root: Option<&Path>) -> Result<Clip> {
    if record.path.is_empty() {
        return Err(SiftError::malformed(record.line, "empty path"));
    }
    let path = match audio_root {
        Some(root) => root.join(&record.path),
        None => PathBuf::from(&record.path),
    };
    Ok(Clip {
        path,
        duration_ms: None,
        client_id: record.client_id.clone(),
        sentence_id: record.sentence_id.clone(),
        sentence: record.sentence.clone(),
        sentence_domain: record.sentence_domain.clone(),
        up_votes: parse_votes(record, "up_votes", &record.up_votes)?,
        down_votes: parse_votes(record, "down_votes", &record.down_votes)?,
        age: record.age.clone(),
        gender: record.gender.clone(),
        accents: record.accents.clone(),
        variant: record.variant.clone(),
        locale: record.locale.clone(),
        segment: record.segment.clone(),
        mos: None,
    })
}

/// Absolute form of a clip path, used as the lookup key.
pub fn clip_key(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Clips keyed by absolute file path, iterated in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct ClipSet {
    root: Option<PathBuf>,
    clips: Vec<Clip>,
    index: HashMap<PathBuf, usize>,
}

impl ClipSet {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            clips: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Directory the clip paths were resolved against.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Insert a clip. A clip with the same key replaces the earlier one in
    /// place and the replaced clip is returned.
    pub fn insert(&mut self, clip: Clip) -> Result<Option<Clip>> {
        let key = clip_key(&clip.path)?;
        match self.index.get(&key) {
            Some(&i) => Ok(Some(std::mem::replace(&mut self.clips[i], clip))),
            None => {
                self.index.insert(key, self.clips.len());
                self.clips.push(clip);
                Ok(None)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    /// Keep the clips matching `keep`, preserving order.
    pub fn filter(self, mut keep: impl FnMut(&Clip) -> bool) -> Result<Self> {
        let mut out = ClipSet::new(self.root);
        for clip in self.clips.into_iter().filter(|c| keep(c)) {
            out.insert(clip)?;
        }
        Ok(out)
    }

    pub fn into_clips(self) -> Vec<Clip> {
        self.clips
    }
}

/// Parse every metadata record into a [`ClipSet`].
///
/// Duplicate file references overwrite the earlier clip.
pub fn parse_clips(records: &[MetadataRecord], audio_root: Option<&Path>) -> Result<ClipSet> {
    let mut clips = ClipSet::new(audio_root.map(Path::to_path_buf));
    for record in records {
        let clip = parse_clip(record, audio_root)?;
        if let Some(replaced) = clips.insert(clip)? {
            warn!(
                line = record.line,
                path = %replaced.path.display(),
                "duplicate clip path, keeping the later record"
            );
        }
    }
    Ok(clips)
}

/// Attach durations to the matching clips.
///
/// Duration file names are resolved against the same root as the clips;
/// records without a matching clip are ignored.
pub fn add_durations(records: &[DurationRecord], clips: ClipSet) -> Result<ClipSet> {
    let mut clips = clips;
    let mut durations = HashMap::with_capacity(records.len());
    for record in records {
        let path = match clips.root() {
            Some(root) => root.join(&record.clip),
            None => PathBuf::from(&record.clip),
        };
        durations.insert(clip_key(&path)?, record.duration_ms);
    }

    let mut unmatched = durations.len();
    for clip in clips.clips.iter_mut() {
        if let Some(&duration) = durations.get(&clip_key(&clip.path)?) {
            clip.duration_ms = Some(duration);
            unmatched -= 1;
        }
    }
    if unmatched > 0 {
        debug!(unmatched, "duration records without a matching clip");
    }
    Ok(clips)
}
