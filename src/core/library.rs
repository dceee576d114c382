/// Story catalog queries over loaded stories.

use rustc_hash::FxHashSet;
use std::cmp::Reverse;

use crate::core::paths::count_distinct_endings;
use crate::schema::progress::ProgressRecord;
use crate::schema::story::Story;

/// Sort orders offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorySortOption {
    TitleAscending,
    TitleDescending,
    ReadingTimeAscending,
    ReadingTimeDescending,
    PathCountAscending,
    PathCountDescending,
}

#[derive(Debug, Clone)]
struct Entry {
    story: Story,
    path_count: usize,
}

/// An owned collection of stories in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StoryLibrary {
    entries: Vec<Entry>,
}

impl StoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a story, replacing any story with the same id in place.
    pub fn insert(&mut self, story: Story) {
        let path_count = count_distinct_endings(&story);
        let entry = Entry { story, path_count };
        match self.entries.iter_mut().find(|e| e.story.id == entry.story.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stories(&self) -> impl Iterator<Item = &Story> {
        self.entries.iter().map(|e| &e.story)
    }

    pub fn get(&self, id: &str) -> Option<&Story> {
        self.stories().find(|s| s.id == id)
    }

    /// Cached Distinct Ending Count for a story in the library.
    pub fn path_count(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.story.id == id)
            .map(|e| e.path_count)
    }

    pub fn with_tag(&self, tag: &str) -> Vec<&Story> {
        self.filter(|s| s.metadata.tags.iter().any(|t| t == tag))
    }

    pub fn for_age_range(&self, age_range: &str) -> Vec<&Story> {
        self.filter(|s| s.metadata.age_range == age_range)
    }

    pub fn from_culture(&self, culture: &str) -> Vec<&Story> {
        self.filter(|s| s.metadata.cultural_origin.as_deref() == Some(culture))
    }

    pub fn purchased(&self) -> Vec<&Story> {
        self.filter(|s| s.metadata.is_purchased)
    }

    pub fn unpurchased(&self) -> Vec<&Story> {
        self.filter(|s| !s.metadata.is_purchased)
    }

    pub fn all_tags(&self) -> Vec<String> {
        sorted_unique(self.stories().flat_map(|s| s.metadata.tags.iter()))
    }

    pub fn all_cultures(&self) -> Vec<String> {
        sorted_unique(self.stories().filter_map(|s| s.metadata.cultural_origin.as_ref()))
    }

    pub fn all_age_ranges(&self) -> Vec<String> {
        sorted_unique(self.stories().map(|s| &s.metadata.age_range))
    }

    /// Case-insensitive substring match over title and synopsis.
    pub fn search(&self, query: &str) -> Vec<&Story> {
        let query = query.to_lowercase();
        self.filter(|s| {
            s.metadata.title.to_lowercase().contains(&query)
                || s.metadata.synopsis.to_lowercase().contains(&query)
        })
    }

    pub fn sorted(&self, option: StorySortOption) -> Vec<&Story> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        match option {
            StorySortOption::TitleAscending => {
                entries.sort_by(|a, b| a.story.metadata.title.cmp(&b.story.metadata.title))
            }
            StorySortOption::TitleDescending => {
                entries.sort_by(|a, b| b.story.metadata.title.cmp(&a.story.metadata.title))
            }
            StorySortOption::ReadingTimeAscending => {
                entries.sort_by_key(|e| e.story.metadata.estimated_reading_minutes)
            }
            StorySortOption::ReadingTimeDescending => {
                entries.sort_by_key(|e| Reverse(e.story.metadata.estimated_reading_minutes))
            }
            StorySortOption::PathCountAscending => entries.sort_by_key(|e| e.path_count),
            StorySortOption::PathCountDescending => entries.sort_by_key(|e| Reverse(e.path_count)),
        }
        entries.into_iter().map(|e| &e.story).collect()
    }

    /// The story most recently read according to `records`, or the first
    /// story when none has been read.
    pub fn featured(&self, records: &[ProgressRecord]) -> Option<&Story> {
        records
            .iter()
            .filter_map(|r| self.get(&r.story_id).map(|s| (s, r.last_activity)))
            .max_by_key(|(_, when)| *when)
            .map(|(story, _)| story)
            .or_else(|| self.stories().next())
    }

    fn filter(&self, pred: impl Fn(&Story) -> bool) -> Vec<&Story> {
        self.stories().filter(|s| pred(s)).collect()
    }
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let set: FxHashSet<&String> = values.collect();
    let mut out: Vec<String> = set.into_iter().cloned().collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{seg, story};
    use crate::core::tracker;
    use chrono::{TimeZone, Utc};

    fn catalog_story(
        id: &str,
        title: &str,
        minutes: u32,
        tags: &[&str],
        culture: Option<&str>,
        purchased: bool,
        endings: usize,
    ) -> Story {
        let targets: Vec<String> = (0..endings).map(|i| format!("end{}", i)).collect();
        let target_refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        let mut segments = vec![seg("start", &target_refs)];
        segments.extend(targets.iter().map(|t| seg(t, &[])));

        let mut s = story(segments);
        s.id = id.to_string();
        s.metadata.title = title.to_string();
        s.metadata.synopsis = format!("All about {}", title);
        s.metadata.estimated_reading_minutes = minutes;
        s.metadata.tags = tags.iter().map(|t| t.to_string()).collect();
        s.metadata.cultural_origin = culture.map(str::to_string);
        s.metadata.is_purchased = purchased;
        s.metadata.age_range = (if minutes > 10 { "8-12" } else { "4-8" }).to_string();
        s
    }

    fn library() -> StoryLibrary {
        let mut lib = StoryLibrary::new();
        lib.insert(catalog_story("red", "Little Red Riding Hood", 8, &["fairy tale", "wolf"], Some("German"), true, 3));
        lib.insert(catalog_story("anansi", "Anansi and the Pot", 12, &["trickster"], Some("Akan"), false, 5));
        lib.insert(catalog_story("pigs", "Three Little Pigs", 5, &["wolf"], Some("English"), true, 2));
        lib
    }

    fn ids(stories: Vec<&Story>) -> Vec<&str> {
        stories.into_iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn insert_caches_path_count_and_replaces() {
        let mut lib = library();
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.path_count("anansi"), Some(5));

        lib.insert(catalog_story("anansi", "Anansi Again", 12, &[], None, false, 1));
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.path_count("anansi"), Some(1));
        assert_eq!(lib.get("anansi").unwrap().metadata.title, "Anansi Again");
        assert!(lib.get("missing").is_none());
    }

    #[test]
    fn filters() {
        let lib = library();
        assert_eq!(ids(lib.with_tag("wolf")), vec!["red", "pigs"]);
        assert_eq!(ids(lib.from_culture("Akan")), vec!["anansi"]);
        assert_eq!(ids(lib.for_age_range("4-8")), vec!["red", "pigs"]);
        assert_eq!(ids(lib.purchased()), vec!["red", "pigs"]);
        assert_eq!(ids(lib.unpurchased()), vec!["anansi"]);
    }

    #[test]
    fn facets_are_sorted_and_unique() {
        let lib = library();
        assert_eq!(lib.all_tags(), vec!["fairy tale", "trickster", "wolf"]);
        assert_eq!(lib.all_cultures(), vec!["Akan", "English", "German"]);
        assert_eq!(lib.all_age_ranges(), vec!["4-8", "8-12"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let lib = library();
        assert_eq!(ids(lib.search("red")), vec!["red"]);
        assert_eq!(ids(lib.search("LITTLE")), vec!["red", "pigs"]);
        assert_eq!(ids(lib.search("about anansi")), vec!["anansi"]);
        assert!(lib.search("dragon").is_empty());
    }

    #[test]
    fn sorting() {
        let lib = library();
        assert_eq!(ids(lib.sorted(StorySortOption::TitleAscending)), vec!["anansi", "red", "pigs"]);
        assert_eq!(ids(lib.sorted(StorySortOption::TitleDescending)), vec!["pigs", "red", "anansi"]);
        assert_eq!(ids(lib.sorted(StorySortOption::ReadingTimeAscending)), vec!["pigs", "red", "anansi"]);
        assert_eq!(ids(lib.sorted(StorySortOption::ReadingTimeDescending)), vec!["anansi", "red", "pigs"]);
        assert_eq!(ids(lib.sorted(StorySortOption::PathCountAscending)), vec!["pigs", "red", "anansi"]);
        assert_eq!(ids(lib.sorted(StorySortOption::PathCountDescending)), vec!["anansi", "red", "pigs"]);
    }

    #[test]
    fn featured_prefers_most_recent_progress() {
        let lib = library();
        assert_eq!(lib.featured(&[]).unwrap().id, "red");

        let early = Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 10, 2, 8, 0, 0).unwrap();
        let pigs = tracker::initialize_at(lib.get("pigs").unwrap(), "start", early);
        let anansi = tracker::initialize_at(lib.get("anansi").unwrap(), "start", late);
        assert_eq!(lib.featured(&[pigs, anansi]).unwrap().id, "anansi");
    }

    #[test]
    fn featured_ignores_unknown_stories() {
        let lib = library();
        let mut stray = tracker::initialize(lib.get("pigs").unwrap(), "start");
        stray.story_id = "gone".to_string();
        assert_eq!(lib.featured(&[stray]).unwrap().id, "red");
        assert!(StoryLibrary::new().featured(&[]).is_none());
    }
}
