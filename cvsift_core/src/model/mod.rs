//! Clip and speaker entities and their construction from raw records.

pub mod clip;
pub mod record;
pub mod speaker;

pub use clip::{add_durations, parse_clip, parse_clips, Clip, ClipSet};
pub use record::{DurationRecord, MetadataRecord};
pub use speaker::{group_by_speaker, Speaker};
