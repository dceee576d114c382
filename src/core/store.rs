/// Boundary to the host's key-value persistence for progress records.
///
/// The engine never loads or saves on its own; hosts load a record
/// before first use and save it after each mutation.

use std::collections::HashMap;
use thiserror::Error;

use crate::schema::progress::ProgressRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

const PROGRESS_KEY_PREFIX: &str = "storyProgress_";

/// Storage key for a story's progress record.
pub fn progress_key(story_id: &str) -> String {
    format!("{}{}", PROGRESS_KEY_PREFIX, story_id)
}

pub trait ProgressStore {
    fn load(&self, story_id: &str) -> Result<Option<ProgressRecord>, StoreError>;
    fn save(&mut self, record: &ProgressRecord) -> Result<(), StoreError>;
    fn clear(&mut self, story_id: &str);
}

/// Keeps records as JSON strings in memory, keyed like the on-device
/// store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    entries: HashMap<String, String>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw stored document, if any.
    pub fn raw(&self, story_id: &str) -> Option<&str> {
        self.entries.get(&progress_key(story_id)).map(String::as_str)
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, story_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
        match self.entries.get(&progress_key(story_id)) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.entries.insert(progress_key(&record.story_id), json);
        Ok(())
    }

    fn clear(&mut self, story_id: &str) {
        self.entries.remove(&progress_key(story_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{seg, story};
    use crate::core::tracker;

    #[test]
    fn key_format() {
        assert_eq!(progress_key("fox"), "storyProgress_fox");
    }

    #[test]
    fn save_then_load() {
        let s = story(vec![seg("start", &["end"]), seg("end", &[])]);
        let mut record = tracker::initialize(&s, "start");
        tracker::record_choice(&mut record, &s.segments[0].choices[0]);

        let mut store = MemoryProgressStore::new();
        assert!(store.load("test").unwrap().is_none());
        store.save(&record).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.raw("test").unwrap().contains("\"currentSegmentId\":\"end\""));
        assert_eq!(store.load("test").unwrap(), Some(record));
    }

    #[test]
    fn clear_removes_record() {
        let s = story(vec![seg("start", &[])]);
        let mut store = MemoryProgressStore::new();
        store.save(&tracker::initialize(&s, "start")).unwrap();
        store.clear("test");
        assert!(store.is_empty());
        assert!(store.load("test").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let mut store = MemoryProgressStore::new();
        store
            .entries
            .insert(progress_key("test"), "{not json".to_string());
        assert!(matches!(store.load("test"), Err(StoreError::Serialize(_))));
    }
}
