//! Reading and writing the corpus tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cvsift_core::model::record::{DURATION_COLUMN, DURATION_TABLE_COLUMNS, METADATA_COLUMNS};
use cvsift_core::{Clip, DurationRecord, MetadataRecord, SiftError};
use tracing::debug;

pub const TRAIN_TSV: &str = "train.tsv";
pub const DURATIONS_TSV: &str = "clip_durations.tsv";
pub const CLIPS_DIR: &str = "clips";

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open TSV: {}", path.display()))
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))
}

/// Read every row of a metadata table. The header row is skipped.
pub fn read_metadata(path: &Path) -> Result<Vec<MetadataRecord>> {
    let mut rdr = tsv_reader(path)?;
    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row =
            result.with_context(|| format!("Failed to parse a TSV row in {}", path.display()))?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(i + 2);
        let fields: Vec<&str> = row.iter().collect();
        let record = MetadataRecord::from_fields(&fields, line)
            .with_context(|| format!("in {}", path.display()))?;
        records.push(record);
    }
    debug!(rows = records.len(), path = %path.display(), "read metadata table");
    Ok(records)
}

/// Read every row of a durations table. The header row is skipped.
pub fn read_durations(path: &Path) -> Result<Vec<DurationRecord>> {
    let mut rdr = tsv_reader(path)?;
    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row =
            result.with_context(|| format!("Failed to parse a TSV row in {}", path.display()))?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(i + 2);
        let malformed = |reason: String| SiftError::MalformedRecord { line, reason };
        if row.len() != DURATION_TABLE_COLUMNS.len() {
            return Err(malformed(format!("expected 2 fields, found {}", row.len())))
                .with_context(|| format!("in {}", path.display()));
        }
        let record: DurationRecord = row
            .deserialize(None)
            .map_err(|e| malformed(e.to_string()))
            .with_context(|| format!("in {}", path.display()))?;
        records.push(record);
    }
    debug!(rows = records.len(), path = %path.display(), "read durations table");
    Ok(records)
}

/// Write `train.tsv`: the corpus columns plus the trimmed duration, with
/// `path` reduced to the file name.
pub fn write_train_table<'a>(
    path: &Path,
    clips: impl IntoIterator<Item = &'a Clip>,
) -> Result<usize> {
    let mut wtr = tsv_writer(path)?;
    let mut header: Vec<&str> = METADATA_COLUMNS.to_vec();
    header.push(DURATION_COLUMN);
    wtr.write_record(&header)?;
    let mut rows = 0;
    for clip in clips {
        wtr.write_record(clip.to_record().fields())?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

/// Write `clip_durations.tsv`.
pub fn write_duration_table<'a>(
    path: &Path,
    clips: impl IntoIterator<Item = &'a Clip>,
) -> Result<usize> {
    let mut wtr = tsv_writer(path)?;
    wtr.write_record(DURATION_TABLE_COLUMNS)?;
    let mut rows = 0;
    for clip in clips {
        wtr.write_record(clip.duration_fields())?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

/// Both output tables written by [`write_tables`].
#[derive(Debug, Clone)]
pub struct OutputTables {
    pub train: PathBuf,
    pub durations: PathBuf,
    pub rows: usize,
}

/// Write `train.tsv` and `clip_durations.tsv` under `out_dir`.
pub fn write_tables(out_dir: &Path, clips: &[&Clip]) -> Result<OutputTables> {
    let train = out_dir.join(TRAIN_TSV);
    let durations = out_dir.join(DURATIONS_TSV);
    let rows = write_train_table(&train, clips.iter().copied())?;
    write_duration_table(&durations, clips.iter().copied())?;
    Ok(OutputTables {
        train,
        durations,
        rows,
    })
}
