/// Indexed, read-only view over a story's segment graph.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::schema::story::{Segment, Story};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("story has no segments")]
    EmptyStory,
    #[error("segment not found: {0}")]
    SegmentNotFound(String),
}

/// Borrowed lookup structure for a [`Story`].
///
/// Ids are resolved to the first segment carrying them in document
/// order, so a document with duplicate ids behaves as if the later
/// copies were absent.
#[derive(Debug, Clone)]
pub struct StoryGraph<'a> {
    story: &'a Story,
    index: FxHashMap<&'a str, usize>,
}

impl<'a> StoryGraph<'a> {
    pub fn new(story: &'a Story) -> Self {
        let mut index = FxHashMap::default();
        for (i, segment) in story.segments.iter().enumerate() {
            index.entry(segment.id.as_str()).or_insert(i);
        }
        Self { story, index }
    }

    pub fn story(&self) -> &'a Story {
        self.story
    }

    pub fn segments(&self) -> &'a [Segment] {
        &self.story.segments
    }

    /// The entry point: the first segment in document order.
    pub fn root(&self) -> Result<&'a Segment, GraphError> {
        self.story.segments.first().ok_or(GraphError::EmptyStory)
    }

    /// Look up a segment, failing if the id is unknown.
    pub fn segment(&self, id: &str) -> Result<&'a Segment, GraphError> {
        self.get(id)
            .ok_or_else(|| GraphError::SegmentNotFound(id.to_string()))
    }

    /// Guard-style lookup for traversals that treat a missing target as a
    /// dead end.
    pub fn get(&self, id: &str) -> Option<&'a Segment> {
        self.index_of(id).map(|i| &self.story.segments[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_ending(&self, id: &str) -> Result<bool, GraphError> {
        Ok(self.segment(id)?.is_ending())
    }
}

impl Story {
    /// Build an indexed view for lookups and traversal.
    pub fn graph(&self) -> StoryGraph<'_> {
        StoryGraph::new(self)
    }
}
