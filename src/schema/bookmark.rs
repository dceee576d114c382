use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::progress::ProgressRecord;

/// A saved reading position the reader can jump back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub story_id: String,
    pub segment_id: String,
    pub path_history: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub name: Option<String>,
}

impl Bookmark {
    /// Capture the reader's current position.
    pub fn capture(record: &ProgressRecord, name: Option<String>) -> Bookmark {
        Self::capture_at(record, name, Utc::now())
    }

    pub fn capture_at(
        record: &ProgressRecord,
        name: Option<String>,
        now: DateTime<Utc>,
    ) -> Bookmark {
        Bookmark {
            id: Uuid::new_v4(),
            story_id: record.story_id.clone(),
            segment_id: record.current_segment_id.clone(),
            path_history: record.history.clone(),
            created_date: now,
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn capture_copies_position() {
        let record = ProgressRecord {
            story_id: "fox".to_string(),
            current_segment_id: "field".to_string(),
            history: vec!["den".to_string(), "field".to_string()],
            visited_segments: BTreeSet::new(),
            completed_paths: BTreeSet::new(),
            last_activity: Utc::now(),
            completion: 0.0,
        };
        let a = Bookmark::capture(&record, Some("before the hen".to_string()));
        let b = Bookmark::capture(&record, None);

        assert_eq!(a.story_id, "fox");
        assert_eq!(a.segment_id, "field");
        assert_eq!(a.path_history, record.history);
        assert_eq!(a.name.as_deref(), Some("before the hen"));
        assert_ne!(a.id, b.id);
    }
}
