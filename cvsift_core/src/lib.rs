//! # cvsift core
//!
//! Filters a Common Voice style corpus down to clips and speakers suitable
//! for multi-speaker TTS training.
//!
//! ```text
//! train.tsv + clip_durations.tsv
//!   -> clips (duration <= 16.7 s)
//!   -> 16 kHz mono WAV, silence trimmed at -50 dBFS
//!   -> speakers (> 20 min, capped at 10 h)
//!   -> MOS scored, mean >= threshold
//! ```

pub mod audio;
pub mod config;
pub mod duration;
pub mod error;
pub mod model;
pub mod mos;
pub mod pipeline;

pub use config::FilterConfig;
pub use error::SiftError;
pub use model::{Clip, DurationRecord, MetadataRecord, Speaker};
pub use mos::MosModel;
pub use pipeline::{Pipeline, PipelineOutput, PipelineReport};
