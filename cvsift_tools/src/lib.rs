//! File formats around the core pipeline: the corpus TSV tables and a JSONL
//! manifest of the filtered clips.

pub mod manifest;
pub mod tsv;

pub use manifest::write_manifest;
pub use tsv::{read_durations, read_metadata, write_tables, OutputTables};
