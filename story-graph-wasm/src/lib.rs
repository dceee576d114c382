//! WASM bindings for story-graph, used by the web reader and authoring preview.

use std::collections::BTreeSet;
use wasm_bindgen::prelude::*;

use story_graph::core::engine::{EngineConfig, StoryEngine};
use story_graph::core::map;
use story_graph::core::paths::count_distinct_endings;
use story_graph::core::validate::{validation_messages, ValidationPolicy};
use story_graph::schema::progress::ProgressRecord;
use story_graph::schema::story::Story;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ChoiceView {
    text: String,
    visited: bool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SegmentView {
    segment_id: String,
    text: String,
    audio_file_name: Option<String>,
    image_file_name: Option<String>,
    is_ending: bool,
    choices: Vec<ChoiceView>,
    endings_discovered: usize,
    ending_count: usize,
    completion: f64,
}

fn parse_story(story_json: &str) -> Result<Story, JsError> {
    Story::from_json(story_json).map_err(|e| JsError::new(&format!("Invalid story JSON: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Stateless helpers for authoring tools
// ---------------------------------------------------------------------------

/// Validate a story document. Returns a JSON array of warning messages.
#[wasm_bindgen]
pub fn validate_story(story_json: &str) -> Result<String, JsError> {
    let story = parse_story(story_json)?;
    to_json(&validation_messages(&story))
}

/// Distinct Ending Count of a story document.
#[wasm_bindgen]
pub fn count_endings(story_json: &str) -> Result<usize, JsError> {
    Ok(count_distinct_endings(&parse_story(story_json)?))
}

/// Lay out a story as a tree. `visited_json` is an optional JSON array of
/// segment ids to mark as explored.
#[wasm_bindgen]
pub fn build_map(story_json: &str, visited_json: Option<String>) -> Result<String, JsError> {
    let story = parse_story(story_json)?;
    let visited: Option<BTreeSet<String>> = match visited_json {
        Some(json) => Some(
            serde_json::from_str(&json)
                .map_err(|e| JsError::new(&format!("Invalid visited JSON: {e}")))?,
        ),
        None => None,
    };
    to_json(&map::build_map(&story, visited.as_ref()))
}

// ---------------------------------------------------------------------------
// StoryReader: one story plus one reader's progress
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryReader {
    engine: StoryEngine,
    record: ProgressRecord,
}

#[wasm_bindgen]
impl StoryReader {
    /// Load a story and optionally resume from a saved progress record.
    /// `advisory` accepts stories with structural warnings.
    #[wasm_bindgen(constructor)]
    pub fn new(
        story_json: &str,
        progress_json: Option<String>,
        advisory: bool,
    ) -> Result<StoryReader, JsError> {
        let story = parse_story(story_json)?;
        let config = EngineConfig {
            policy: if advisory {
                ValidationPolicy::Advisory
            } else {
                ValidationPolicy::Strict
            },
            ..EngineConfig::default()
        };
        let engine = StoryEngine::builder()
            .story(story)
            .with_config(config)
            .build()
            .map_err(|e| JsError::new(&format!("Story load error: {e}")))?;

        let record = match progress_json {
            Some(json) => {
                let saved: ProgressRecord = serde_json::from_str(&json)
                    .map_err(|e| JsError::new(&format!("Invalid progress JSON: {e}")))?;
                engine
                    .resume(saved)
                    .map_err(|e| JsError::new(&format!("Progress error: {e}")))?
            }
            None => engine.start(),
        };

        Ok(StoryReader { engine, record })
    }

    /// JSON view of the current segment.
    pub fn current(&self) -> Result<String, JsError> {
        to_json(&self.view()?)
    }

    /// Take the `index`-th choice and return the new segment view.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        self.engine
            .choose(&mut self.record, index)
            .map_err(|e| JsError::new(&format!("Choice error: {e}")))?;
        self.current()
    }

    pub fn restart(&mut self) -> Result<String, JsError> {
        self.engine
            .restart(&mut self.record)
            .map_err(|e| JsError::new(&format!("Restart error: {e}")))?;
        self.current()
    }

    /// The progress record, for the host to persist.
    pub fn progress_json(&self) -> Result<String, JsError> {
        to_json(&self.record)
    }

    /// Map shaded by this reader's visited segments.
    pub fn map_json(&self) -> Result<String, JsError> {
        to_json(&self.engine.map(Some(&self.record)))
    }

    pub fn ending_count(&self) -> usize {
        self.engine.ending_count()
    }

    /// JSON array of warnings the story was accepted with.
    pub fn warnings(&self) -> Result<String, JsError> {
        let messages: Vec<String> = self
            .engine
            .warnings()
            .iter()
            .map(ToString::to_string)
            .collect();
        to_json(&messages)
    }
}

// Private helpers
impl StoryReader {
    fn view(&self) -> Result<SegmentView, JsError> {
        let segment = self
            .engine
            .current_segment(&self.record)
            .map_err(|e| JsError::new(&format!("Progress error: {e}")))?;
        Ok(SegmentView {
            segment_id: segment.id.clone(),
            text: segment.text.clone(),
            audio_file_name: segment.audio_file_name.clone(),
            image_file_name: segment.image_file_name.clone(),
            is_ending: segment.is_ending(),
            choices: segment
                .choices
                .iter()
                .map(|c| ChoiceView {
                    text: c.text.clone(),
                    visited: self.record.is_visited(&c.next_segment_id),
                })
                .collect(),
            endings_discovered: self.record.endings_discovered(),
            ending_count: self.engine.ending_count(),
            completion: self.record.completion,
        })
    }
}
