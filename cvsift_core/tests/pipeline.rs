use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use cvsift_core::audio::wav::{read_wav, write_wav};
use cvsift_core::{DurationRecord, FilterConfig, MetadataRecord, MosModel, Pipeline, SiftError};

const RATE: u32 = 16_000;

struct FakeMos(HashMap<String, f32>);

impl MosModel for FakeMos {
    fn predict(&mut self, path: &Path) -> anyhow::Result<f32> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.0
            .get(&name)
            .copied()
            .ok_or_else(|| anyhow!("model crashed on {name}"))
    }
}

fn fake_mos(entries: &[(&str, f32)]) -> FakeMos {
    FakeMos(entries.iter().map(|(k, v)| (k.to_string(), *v)).collect())
}

fn tone(ms: usize) -> Vec<f32> {
    let n = ms * RATE as usize / 1000;
    (0..n)
        .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / RATE as f32).sin())
        .collect()
}

struct Corpus {
    _dir: tempfile::TempDir,
    clips: PathBuf,
    out: PathBuf,
    metadata: Vec<MetadataRecord>,
    durations: Vec<DurationRecord>,
}

impl Corpus {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clips = dir.path().join("clips");
        let out = dir.path().join("out");
        std::fs::create_dir(&clips).unwrap();
        std::fs::create_dir(&out).unwrap();
        Self {
            _dir: dir,
            clips,
            out,
            metadata: Vec::new(),
            durations: Vec::new(),
        }
    }

    /// Add a clip; `audio` of `None` leaves the file missing.
    fn add(&mut self, client: &str, name: &str, listed_ms: u64, audio: Option<Vec<f32>>) {
        if let Some(samples) = audio {
            write_wav(&self.clips.join(name), &samples, RATE).unwrap();
        }
        let line = format!(
            "{client}\t{name}\tsid-{name}\tSentence for {name}.\t\t2\t0\tforties\t\t\t\tnl\t"
        );
        let mut record: MetadataRecord = line.parse().unwrap();
        record.line = self.metadata.len() + 2;
        self.metadata.push(record);
        self.durations.push(DurationRecord {
            clip: name.to_string(),
            duration_ms: listed_ms,
        });
    }
}

fn config() -> FilterConfig {
    FilterConfig {
        max_clip_ms: 1_500,
        min_speaker_ms: 1_500,
        max_speaker_ms: 3_000,
        ..FilterConfig::default()
    }
}

#[test]
fn full_run_applies_every_stage() {
    let mut corpus = Corpus::new();
    for name in ["a1.wav", "a2.wav", "a3.wav", "a4.wav"] {
        corpus.add("A", name, 1000, Some(tone(1000)));
    }
    corpus.add("B", "b1.wav", 2000, None);
    corpus.add("B", "b2.wav", 1000, Some(tone(1000)));
    corpus.add("D", "d1.wav", 1000, Some(tone(1000)));
    corpus.add("D", "d2.wav", 1000, Some(tone(1000)));
    let mut padded = vec![0.0; 6_400];
    padded.extend(tone(600));
    corpus.add("D", "d3.wav", 1000, Some(padded));
    corpus.add("E", "e1.wav", 1000, Some(tone(1000)));
    corpus.add("E", "e2.wav", 1000, Some(tone(1000)));

    let mut model = fake_mos(&[
        ("a1.wav", 3.0),
        ("a2.wav", 4.0),
        ("a3.wav", 3.5),
        ("a4.wav", 1.0),
        ("d2.wav", 3.0),
        ("d3.wav", 3.0),
        ("e1.wav", 1.0),
        ("e2.wav", 1.5),
    ]);

    let output = Pipeline::new(config())
        .with_output_clip_dir(&corpus.out)
        .run(&mut model, &corpus.metadata, &corpus.durations, &corpus.clips)
        .unwrap();

    let ids: Vec<_> = output.speakers.iter().map(|s| s.client_id()).collect();
    assert_eq!(ids, ["A", "D"]);

    let a = &output.speakers[0];
    let names: Vec<_> = a.clips().iter().map(|c| c.file_name().into_owned()).collect();
    assert_eq!(names, ["a1.wav", "a2.wav", "a3.wav"]);
    assert_eq!(a.mos(), Some(3.5));

    let d = &output.speakers[1];
    let names: Vec<_> = d.clips().iter().map(|c| c.file_name().into_owned()).collect();
    assert_eq!(names, ["d2.wav", "d3.wav"]);
    assert_eq!(d.clips()[1].duration_ms, Some(600));
    assert_eq!(d.mos(), Some(3.0));

    for clip in output.clips() {
        assert!(clip.path.starts_with(&corpus.out));
        let (samples, rate) = read_wav(&clip.path).unwrap();
        assert_eq!(rate, RATE);
        assert_eq!(samples.len() as u64 * 1000 / RATE as u64, clip.duration_ms.unwrap());
    }

    let report = output.report;
    assert_eq!(report.clips_parsed, 11);
    assert_eq!(report.clips_within_duration, 10);
    assert_eq!(report.clips_sharing_output, 0);
    assert_eq!(report.speakers_found, 4);
    assert_eq!(report.speakers_within_duration, 3);
    assert_eq!(report.clips_scored, 7);
    assert_eq!(report.clips_failed_scoring, 1);
    assert_eq!(report.speakers_accepted, 2);
    assert_eq!(report.clips_accepted, 5);
}

#[test]
fn same_stem_sources_share_one_output_file() {
    let mut corpus = Corpus::new();
    std::fs::create_dir(corpus.clips.join("sub")).unwrap();
    corpus.add("A", "a.wav", 1000, Some(tone(1000)));
    corpus.add("A", "sub/a.wav", 1000, Some(tone(1000)));
    let mut model = fake_mos(&[("a.wav", 4.0)]);

    let output = Pipeline::new(config())
        .with_output_clip_dir(&corpus.out)
        .run(&mut model, &corpus.metadata, &corpus.durations, &corpus.clips)
        .unwrap();

    assert_eq!(output.report.clips_sharing_output, 1);
    let paths: Vec<_> = output.clips().map(|c| c.path.clone()).collect();
    assert_eq!(paths, [corpus.out.join("a.wav"), corpus.out.join("a.wav")]);
}

#[test]
fn unreadable_audio_aborts_by_default() {
    let mut corpus = Corpus::new();
    corpus.add("A", "gone.mp3", 1000, None);
    let mut model = fake_mos(&[]);
    let err = Pipeline::new(config())
        .with_output_clip_dir(&corpus.out)
        .run(&mut model, &corpus.metadata, &corpus.durations, &corpus.clips)
        .unwrap_err();
    assert!(matches!(err, SiftError::Audio { .. }));
}

#[test]
fn unreadable_audio_can_be_skipped() {
    let mut corpus = Corpus::new();
    corpus.add("A", "gone.mp3", 1000, None);
    corpus.add("A", "a1.wav", 1000, Some(tone(1000)));
    corpus.add("A", "a2.wav", 1000, Some(tone(1000)));
    let mut model = fake_mos(&[("a1.wav", 4.0), ("a2.wav", 4.0)]);
    let config = FilterConfig {
        skip_unreadable_audio: true,
        ..config()
    };
    let output = Pipeline::new(config)
        .with_output_clip_dir(&corpus.out)
        .run(&mut model, &corpus.metadata, &corpus.durations, &corpus.clips)
        .unwrap();
    assert_eq!(output.report.clips_unreadable, 1);
    assert_eq!(output.clips().count(), 2);
}

#[test]
fn malformed_metadata_aborts_before_audio_work() {
    let mut corpus = Corpus::new();
    corpus.add("A", "a1.wav", 1000, Some(tone(1000)));
    corpus.metadata[0].down_votes = "-".to_string();
    let mut model = fake_mos(&[]);
    let err = Pipeline::new(config())
        .with_output_clip_dir(&corpus.out)
        .run(&mut model, &corpus.metadata, &corpus.durations, &corpus.clips)
        .unwrap_err();
    assert!(matches!(err, SiftError::MalformedRecord { line: 2, .. }));
    assert_eq!(std::fs::read_dir(&corpus.out).unwrap().count(), 0);
}
