/// The story engine: one validated story plus the derived values every
/// reading session needs.
///
/// Wires together validation, ending enumeration, progress transitions,
/// and map building behind a single owner. Hosts construct one engine
/// per loaded story and pass progress records in explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::graph::{GraphError, StoryGraph};
use crate::core::map::{build_map, StoryMap};
use crate::core::paths::{count_distinct_endings, distinct_endings, Ending};
use crate::core::tracker;
use crate::core::validate::{validate_story, ValidationPolicy, ValidationWarning};
use crate::schema::bookmark::Bookmark;
use crate::schema::progress::ProgressRecord;
use crate::schema::story::{Segment, Story};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("story '{story_id}' failed validation: {}", .warnings.join("; "))]
    InvalidStory {
        story_id: String,
        warnings: Vec<String>,
    },
    #[error("choice {index} out of range for segment '{segment_id}' ({available} available)")]
    ChoiceOutOfRange {
        segment_id: String,
        index: usize,
        available: usize,
    },
    #[error("progress belongs to story '{found}', expected '{expected}'")]
    StoryMismatch { expected: String, found: String },
    #[error("RON config error: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("no story was given to the builder")]
    MissingStory,
}

/// Engine settings, usually read from a RON file:
///
/// ```ron
/// (policy: Advisory)
/// ```
///
/// A story containing a loop is refused under every policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: ValidationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::Strict,
        }
    }
}

impl EngineConfig {
    pub fn parse_ron(input: &str) -> Result<EngineConfig, EngineError> {
        Ok(ron::from_str(input)?)
    }

    fn refuses(&self, warnings: &[ValidationWarning]) -> bool {
        !self.policy.accepts(warnings) || warnings.iter().any(ValidationWarning::is_cycle)
    }
}

/// A loaded story. Built via `StoryEngine::builder()`.
#[derive(Debug, Clone)]
pub struct StoryEngine {
    story: Story,
    root_id: String,
    ending_count: usize,
    warnings: Vec<ValidationWarning>,
}

/// Builder for constructing a `StoryEngine`.
#[derive(Debug, Clone, Default)]
pub struct StoryEngineBuilder {
    story: Option<Story>,
    config: EngineConfig,
}

impl StoryEngineBuilder {
    pub fn story(mut self, story: Story) -> Self {
        self.story = Some(story);
        self
    }

    pub fn policy(mut self, policy: ValidationPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the story, apply the policy, and compute the ending count.
    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let story = self.story.ok_or(EngineError::MissingStory)?;
        let root_id = story.graph().root()?.id.clone();

        let warnings = validate_story(&story);
        if self.config.refuses(&warnings) {
            return Err(EngineError::InvalidStory {
                story_id: story.id.clone(),
                warnings: warnings.iter().map(ToString::to_string).collect(),
            });
        }
        for warning in &warnings {
            warn!(story_id = %story.id, %warning, "story accepted with warning");
        }

        let ending_count = count_distinct_endings(&story);
        info!(
            story_id = %story.id,
            segments = story.segments.len(),
            endings = ending_count,
            "story loaded"
        );

        Ok(StoryEngine {
            story,
            root_id,
            ending_count,
            warnings,
        })
    }
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder::default()
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn graph(&self) -> StoryGraph<'_> {
        self.story.graph()
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Distinct Ending Count, computed once at build time.
    pub fn ending_count(&self) -> usize {
        self.ending_count
    }

    /// Warnings accepted under the configured policy.
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn endings(&self) -> Vec<Ending> {
        distinct_endings(&self.story)
    }

    /// A fresh progress record at the root.
    pub fn start(&self) -> ProgressRecord {
        tracker::initialize(&self.story, &self.root_id)
    }

    /// Accept a record loaded by the host, checking it belongs here.
    pub fn resume(&self, record: ProgressRecord) -> Result<ProgressRecord, EngineError> {
        self.check_owner(&record.story_id)?;
        self.graph().segment(&record.current_segment_id)?;
        Ok(record)
    }

    pub fn current_segment(&self, record: &ProgressRecord) -> Result<&Segment, EngineError> {
        self.check_owner(&record.story_id)?;
        Ok(self.graph().segment(&record.current_segment_id)?)
    }

    pub fn is_at_ending(&self, record: &ProgressRecord) -> Result<bool, EngineError> {
        Ok(self.current_segment(record)?.is_ending())
    }

    /// Take the `index`-th choice of the current segment. Returns the
    /// segment the reader lands on.
    pub fn choose(
        &self,
        record: &mut ProgressRecord,
        index: usize,
    ) -> Result<&Segment, EngineError> {
        self.choose_at(record, index, Utc::now())
    }

    pub fn choose_at(
        &self,
        record: &mut ProgressRecord,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<&Segment, EngineError> {
        let graph = self.graph();
        let current = self.current_segment(record)?;
        let choice = current
            .choices
            .get(index)
            .ok_or_else(|| EngineError::ChoiceOutOfRange {
                segment_id: current.id.clone(),
                index,
                available: current.choices.len(),
            })?;
        // Resolve before mutating so a dangling choice leaves the record as it was.
        let next = graph.segment(&choice.next_segment_id)?;

        tracker::record_choice_at(record, choice, now);
        tracker::check_and_mark_ending(record, next, self.ending_count);
        Ok(next)
    }

    pub fn restart(&self, record: &mut ProgressRecord) -> Result<(), EngineError> {
        self.check_owner(&record.story_id)?;
        tracker::restart(record, &self.root_id);
        Ok(())
    }

    /// Map of the story, shaded by the record's visited segments if given.
    pub fn map(&self, record: Option<&ProgressRecord>) -> StoryMap {
        build_map(&self.story, record.map(|r| &r.visited_segments))
    }

    pub fn bookmark(
        &self,
        record: &ProgressRecord,
        name: Option<String>,
    ) -> Result<Bookmark, EngineError> {
        self.check_owner(&record.story_id)?;
        Ok(Bookmark::capture(record, name))
    }

    pub fn restore_bookmark(
        &self,
        record: &mut ProgressRecord,
        bookmark: &Bookmark,
    ) -> Result<(), EngineError> {
        self.check_owner(&record.story_id)?;
        self.check_owner(&bookmark.story_id)?;
        let graph = self.graph();
        graph.segment(&bookmark.segment_id)?;
        for id in &bookmark.path_history {
            graph.segment(id)?;
        }
        tracker::restore_bookmark(record, bookmark);
        Ok(())
    }

    fn check_owner(&self, story_id: &str) -> Result<(), EngineError> {
        if story_id != self.story.id {
            return Err(EngineError::StoryMismatch {
                expected: self.story.id.clone(),
                found: story_id.to_string(),
            });
        }
        Ok(())
    }
}
