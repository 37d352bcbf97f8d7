//! Raw rows of the corpus tables, before any interpretation.

use std::fmt;
use std::str::FromStr;

use crate::error::SiftError;

/// Column names of the metadata table, in order.
pub const METADATA_COLUMNS: [&str; 13] = [
    "client_id",
    "path",
    "sentence_id",
    "sentence",
    "sentence_domain",
    "up_votes",
    "down_votes",
    "age",
    "gender",
    "accents",
    "variant",
    "locale",
    "segment",
];

/// Extra column carried by the filtered output table.
pub const DURATION_COLUMN: &str = "duration_ms";

/// Header of the durations table.
pub const DURATION_TABLE_COLUMNS: [&str; 2] = ["clip", "duration[ms]"];

/// One row of `train.tsv`, split but not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataRecord {
    /// 1-based line number in the source table, 0 when unknown.
    pub line: usize,
    pub client_id: String,
    pub path: String,
    pub sentence_id: String,
    pub sentence: String,
    pub sentence_domain: String,
    pub up_votes: String,
    pub down_votes: String,
    pub age: String,
    pub gender: String,
    pub accents: String,
    pub variant: String,
    pub locale: String,
    pub segment: String,
    /// Present only on tables written by this tool.
    pub duration_ms: Option<String>,
}

impl MetadataRecord {
    /// Build a record from already split fields.
    ///
    /// Accepts the 13 corpus columns, optionally followed by the trailing
    /// `duration_ms` column of a filtered table.
    pub fn from_fields<S: AsRef<str>>(fields: &[S], line: usize) -> Result<Self, SiftError> {
        if fields.len() != METADATA_COLUMNS.len() && fields.len() != METADATA_COLUMNS.len() + 1 {
            return Err(SiftError::malformed(
                line,
                format!(
                    "expected {} fields, found {}",
                    METADATA_COLUMNS.len(),
                    fields.len()
                ),
            ));
        }
        let f = |i: usize| fields[i].as_ref().to_string();
        Ok(Self {
            line,
            client_id: f(0),
            path: f(1),
            sentence_id: f(2),
            sentence: f(3),
            sentence_domain: f(4),
            up_votes: f(5),
            down_votes: f(6),
            age: f(7),
            gender: f(8),
            accents: f(9),
            variant: f(10),
            locale: f(11),
            segment: f(12),
            duration_ms: fields.get(13).map(|d| d.as_ref().to_string()),
        })
    }

    /// Fields in table order, including `duration_ms` when present.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.client_id.as_str(),
            self.path.as_str(),
            self.sentence_id.as_str(),
            self.sentence.as_str(),
            self.sentence_domain.as_str(),
            self.up_votes.as_str(),
            self.down_votes.as_str(),
            self.age.as_str(),
            self.gender.as_str(),
            self.accents.as_str(),
            self.variant.as_str(),
            self.locale.as_str(),
            self.segment.as_str(),
        ];
        if let Some(duration) = &self.duration_ms {
            fields.push(duration);
        }
        fields
    }
}

impl FromStr for MetadataRecord {
    type Err = SiftError;

    /// Split one tab-delimited line. The line number is left at 0.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        Self::from_fields(&fields, 0)
    }
}

impl fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields().join("\t"))
    }
}

/// One row of `clip_durations.tsv`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct DurationRecord {
    pub clip: String,
    #[serde(rename = "duration[ms]")]
    pub duration_ms: u64,
}
