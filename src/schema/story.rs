/// Story documents and their JSON and RON decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A labeled, directed edge from its owning segment to `next_segment_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub next_segment_id: String,
    #[serde(default)]
    pub is_authentic_path: bool,
}

/// One page of a story. A segment without choices is an ending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub audio_file_name: Option<String>,
    #[serde(default)]
    pub image_file_name: Option<String>,
    #[serde(default)]
    pub is_authentic_path: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Segment {
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Descriptive fields carried alongside a story. None of them affect
/// traversal; they exist for catalogs and presentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryMetadata {
    pub title: String,
    pub author: String,
    pub original_source: Option<String>,
    pub cultural_origin: Option<String>,
    pub synopsis: String,
    pub cover_image_name: String,
    pub estimated_reading_minutes: u32,
    pub age_range: String,
    pub tags: Vec<String>,
    pub is_purchased: bool,
}

/// A branching story. The first segment is the entry point.
///
/// Stories are never mutated once decoded; every algorithm in
/// [`crate::core`] takes them by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    #[serde(flatten)]
    pub metadata: StoryMetadata,
    pub segments: Vec<Segment>,
}

// The RON authoring format is terser than the JSON document shape:
// metadata is nested and choices are positional tuples.

/// `(id, text, target, authentic)`
type RonChoice = (String, String, String, bool);

#[derive(Debug, Deserialize)]
#[serde(rename = "Segment")]
struct RonSegment {
    id: String,
    text: String,
    #[serde(default)]
    authentic: bool,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    choices: Vec<RonChoice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Story")]
struct RonStory {
    id: String,
    #[serde(default)]
    metadata: StoryMetadata,
    segments: Vec<RonSegment>,
}

impl Story {
    /// Decode a story from a JSON document.
    pub fn from_json(input: &str) -> Result<Story, StoryError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Encode this story as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a story from its RON authoring form.
    pub fn parse_ron(input: &str) -> Result<Story, StoryError> {
        let raw: RonStory = ron::from_str(input)?;

        let segments = raw
            .segments
            .into_iter()
            .map(|seg| Segment {
                id: seg.id,
                text: seg.text,
                audio_file_name: seg.audio,
                image_file_name: seg.image,
                is_authentic_path: seg.authentic,
                choices: seg
                    .choices
                    .into_iter()
                    .map(|(id, text, next_segment_id, is_authentic_path)| Choice {
                        id,
                        text,
                        next_segment_id,
                        is_authentic_path,
                    })
                    .collect(),
            })
            .collect();

        Ok(Story {
            id: raw.id,
            metadata: raw.metadata,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORYPATH_JSON: &str = r#"{
      "id": "test-story",
      "title": "Test Story",
      "author": "Test Author",
      "originalSource": null,
      "culturalOrigin": "Test",
      "synopsis": "A test synopsis",
      "coverImageName": "test-cover",
      "estimatedReadingMinutes": 5,
      "ageRange": "4-8",
      "tags": ["test"],
      "isPurchased": true,
      "segments": [
        {
          "id": "start",
          "text": "Once upon a time...",
          "audioFileName": "test.m4a",
          "imageFileName": "test.png",
          "isAuthenticPath": true,
          "choices": [
            { "id": "choice1", "text": "Go left", "nextSegmentId": "end", "isAuthenticPath": true }
          ]
        },
        {
          "id": "end",
          "text": "The end.",
          "audioFileName": null,
          "imageFileName": null,
          "isAuthenticPath": true,
          "choices": []
        }
      ]
    }"#;

    #[test]
    fn decodes_storypath_document() {
        let story = Story::from_json(STORYPATH_JSON).unwrap();
        assert_eq!(story.id, "test-story");
        assert_eq!(story.metadata.title, "Test Story");
        assert_eq!(story.metadata.cultural_origin.as_deref(), Some("Test"));
        assert!(story.metadata.original_source.is_none());
        assert_eq!(story.segments.len(), 2);
        assert_eq!(story.segments[0].choices.len(), 1);
        assert_eq!(story.segments[0].choices[0].next_segment_id, "end");
        assert_eq!(story.segments[0].audio_file_name.as_deref(), Some("test.m4a"));
        assert!(story.segments[1].is_ending());
        assert!(!story.segments[0].is_ending());
    }

    #[test]
    fn missing_optional_fields_default() {
        let story = Story::from_json(
            r#"{"id": "bare", "segments": [{"id": "only", "text": "Alone."}]}"#,
        )
        .unwrap();
        assert_eq!(story.metadata, StoryMetadata::default());
        let seg = &story.segments[0];
        assert!(seg.audio_file_name.is_none());
        assert!(seg.image_file_name.is_none());
        assert!(!seg.is_authentic_path);
        assert!(seg.is_ending());
    }

    #[test]
    fn json_output_uses_document_field_names() {
        let story = Story::from_json(STORYPATH_JSON).unwrap();
        let json = story.to_json().unwrap();
        assert!(json.contains("\"nextSegmentId\""));
        assert!(json.contains("\"isAuthenticPath\""));
        assert!(json.contains("\"estimatedReadingMinutes\""));
        assert_eq!(Story::from_json(&json).unwrap(), story);
    }

    #[test]
    fn parses_ron_authoring_form() {
        let input = r#"Story(
            id: "fox",
            metadata: (title: "The Fox", tags: ["fable"]),
            segments: [
                Segment(
                    id: "den",
                    text: "The fox wakes.",
                    authentic: true,
                    choices: [
                        ("hunt", "Go hunting", "field", true),
                        ("sleep", "Sleep in", "nap", false),
                    ],
                ),
                Segment(id: "field", text: "A hen!", authentic: true),
                Segment(id: "nap", text: "Zzz.", image: Some("nap.png")),
            ],
        )"#;
        let story = Story::parse_ron(input).unwrap();
        assert_eq!(story.id, "fox");
        assert_eq!(story.metadata.title, "The Fox");
        assert_eq!(story.metadata.tags, vec!["fable".to_string()]);
        assert_eq!(story.segments.len(), 3);

        let den = &story.segments[0];
        assert_eq!(den.choices.len(), 2);
        assert_eq!(den.choices[1].id, "sleep");
        assert_eq!(den.choices[1].next_segment_id, "nap");
        assert!(!den.choices[1].is_authentic_path);
        assert_eq!(story.segments[2].image_file_name.as_deref(), Some("nap.png"));
    }

    #[test]
    fn malformed_ron_is_an_error() {
        assert!(matches!(
            Story::parse_ron("Story(id: \"x\", segments: [Segment(id: \"a\")])"),
            Err(StoryError::Ron(_))
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Story::from_json("{\"id\": 3}"), Err(StoryError::Json(_))));
    }
}
