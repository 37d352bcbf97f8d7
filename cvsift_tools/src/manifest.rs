//! JSONL training manifest for the filtered clips.

use anyhow::{Context, Result};
use cvsift_core::Clip;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

#[derive(Debug, Serialize)]
struct ManifestLine<'a> {
    audio_path: String,
    text: &'a str,
    duration_ms: Option<u64>,
    client_id: &'a str,
    mos: Option<f32>,
}

/// Write one JSON object per clip. Clips with an empty sentence are skipped.
pub fn write_manifest<'a>(
    out_path: &Path,
    clips: impl IntoIterator<Item = &'a Clip>,
) -> Result<usize> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let out_file = File::create(out_path)
        .with_context(|| format!("Failed to create output: {}", out_path.display()))?;
    let mut writer = BufWriter::new(out_file);

    let mut kept = 0usize;
    let mut skipped_empty_text = 0usize;

    for clip in clips {
        let text = clip.sentence.trim();
        if text.is_empty() {
            skipped_empty_text += 1;
            continue;
        }

        let line = ManifestLine {
            audio_path: clip.path.to_string_lossy().to_string(),
            text,
            duration_ms: clip.duration_ms,
            client_id: &clip.client_id,
            mos: clip.mos,
        };

        serde_json::to_writer(&mut writer, &line)?;
        writer.write_all(b"\n")?;
        kept += 1;
    }

    writer.flush()?;

    info!(
        path = %out_path.display(),
        kept,
        skipped_empty_text,
        "wrote manifest"
    );

    Ok(kept)
}
