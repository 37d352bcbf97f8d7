//! Error types for the filtering pipeline.

use std::path::PathBuf;

/// Errors raised while parsing, normalizing or scoring a corpus.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// A metadata or duration record does not match the fixed schema.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// The quality model failed on one file.
    #[error("scoring failed for {}: {reason}", path.display())]
    Scoring { path: PathBuf, reason: String },

    /// A required file or directory is missing or has the wrong type.
    #[error("{}: {reason}", path.display())]
    Path { path: PathBuf, reason: String },

    /// Decoding, resampling or writing audio failed.
    #[error("audio processing failed for {}", path.display())]
    Audio {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SiftError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SiftError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn audio(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        SiftError::Audio {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SiftError> = std::result::Result<T, E>;
