use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A reader's state within one story.
///
/// Owned by the host application and persisted by it; mutated only
/// through the functions in [`crate::core::tracker`].
///
/// `history` holds each segment at most once, in first-visit order, and
/// is reset on restart. `visited_segments` and `completed_paths` are
/// cumulative for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub story_id: String,
    pub current_segment_id: String,
    pub history: Vec<String>,
    #[serde(default)]
    pub visited_segments: BTreeSet<String>,
    #[serde(default)]
    pub completed_paths: BTreeSet<String>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub completion: f64,
}

impl ProgressRecord {
    /// Number of distinct endings this reader has reached.
    pub fn endings_discovered(&self) -> usize {
        self.completed_paths.len()
    }

    /// True once the reader has moved past the first segment.
    pub fn has_started(&self) -> bool {
        self.history.len() > 1
    }

    pub fn is_visited(&self, segment_id: &str) -> bool {
        self.visited_segments.contains(segment_id)
    }
}
