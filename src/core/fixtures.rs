//! Story builders shared by unit tests.

use crate::schema::story::{Choice, Segment, Story, StoryMetadata};

/// A segment whose choices lead to `targets`, in order.
pub fn seg(id: &str, targets: &[&str]) -> Segment {
    Segment {
        id: id.to_string(),
        text: format!("Text of {}", id),
        audio_file_name: None,
        image_file_name: None,
        is_authentic_path: false,
        choices: targets
            .iter()
            .enumerate()
            .map(|(i, t)| Choice {
                id: format!("{}-{}", id, i),
                text: format!("Go to {}", t),
                next_segment_id: t.to_string(),
                is_authentic_path: false,
            })
            .collect(),
    }
}

/// Like [`seg`], flagged as part of the canonical path.
pub fn authentic(id: &str, targets: &[&str]) -> Segment {
    Segment {
        is_authentic_path: true,
        ..seg(id, targets)
    }
}

pub fn story(segments: Vec<Segment>) -> Story {
    Story {
        id: "test".to_string(),
        metadata: StoryMetadata {
            title: "Test".to_string(),
            ..StoryMetadata::default()
        },
        segments,
    }
}
