//! Input validation done before any processing starts.

use std::path::{Path, PathBuf};

use cvsift_core::SiftError;
use cvsift_tools::tsv::{CLIPS_DIR, DURATIONS_TSV, TRAIN_TSV};

pub fn verify_dir(dir: &Path) -> Result<(), SiftError> {
    if !dir.exists() {
        return Err(path_error(dir, "does not exist"));
    }
    if !dir.is_dir() {
        return Err(path_error(dir, "is not a directory"));
    }
    Ok(())
}

pub fn verify_file(file: &Path) -> Result<(), SiftError> {
    if !file.exists() {
        return Err(path_error(file, "does not exist"));
    }
    if !file.is_file() {
        return Err(path_error(file, "is not a file"));
    }
    Ok(())
}

fn path_error(path: &Path, reason: &str) -> SiftError {
    SiftError::Path {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// The three inputs of a corpus directory.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub train: PathBuf,
    pub durations: PathBuf,
    pub clips: PathBuf,
}

impl CorpusPaths {
    pub fn verify(cv_dir: &Path) -> Result<Self, SiftError> {
        verify_dir(cv_dir)?;
        let paths = Self {
            train: cv_dir.join(TRAIN_TSV),
            durations: cv_dir.join(DURATIONS_TSV),
            clips: cv_dir.join(CLIPS_DIR),
        };
        verify_file(&paths.train)?;
        verify_file(&paths.durations)?;
        verify_dir(&paths.clips)?;
        Ok(paths)
    }
}

/// Create the output directory and its `clips/` subdirectory.
pub fn prepare_output(output_dir: &Path) -> Result<PathBuf, SiftError> {
    let clips = output_dir.join(CLIPS_DIR);
    std::fs::create_dir_all(&clips)?;
    Ok(clips)
}
