/// Structural checks over a story document.
///
/// Findings are reported as values, never raised: whether a warning
/// blocks use of the story is the caller's decision (see
/// [`ValidationPolicy`]).

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::core::graph::StoryGraph;
use crate::schema::story::Story;

/// A single structural problem found in a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationWarning {
    EmptyStory,
    DanglingReference {
        segment_id: String,
        choice_id: String,
        target_id: String,
    },
    MissingCanonicalPath,
    UnreachableSegment {
        segment_id: String,
    },
    /// A choice leads back to a segment already on the walk that reached it.
    Cycle {
        segment_id: String,
        choice_id: String,
        target_id: String,
    },
}

impl ValidationWarning {
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStory => write!(f, "Story has no segments"),
            Self::DanglingReference {
                segment_id,
                choice_id,
                target_id,
            } => write!(
                f,
                "Segment '{}' has choice '{}' pointing to non-existent segment '{}'",
                segment_id, choice_id, target_id
            ),
            Self::MissingCanonicalPath => {
                write!(f, "Story has no segments marked as authentic path")
            }
            Self::UnreachableSegment { segment_id } => write!(
                f,
                "Segment '{}' is unreachable from the story start",
                segment_id
            ),
            Self::Cycle {
                segment_id,
                choice_id,
                target_id,
            } => write!(
                f,
                "Segment '{}' has choice '{}' looping back to segment '{}'",
                segment_id, choice_id, target_id
            ),
        }
    }
}

/// How a host treats validation warnings when accepting a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationPolicy {
    /// Log warnings and use the story anyway (authoring, previews).
    Advisory,
    /// Refuse any story with at least one warning (release builds).
    #[default]
    Strict,
}

impl ValidationPolicy {
    pub fn accepts(&self, warnings: &[ValidationWarning]) -> bool {
        match self {
            Self::Advisory => true,
            Self::Strict => warnings.is_empty(),
        }
    }
}

/// Run every structural check and collect the findings in order:
/// empty document, dangling references, canonical path, reachability,
/// cycles. Only an empty document stops the run early.
pub fn validate_story(story: &Story) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if story.segments.is_empty() {
        warnings.push(ValidationWarning::EmptyStory);
        return warnings;
    }

    let graph = story.graph();

    for segment in &story.segments {
        for choice in &segment.choices {
            if !graph.contains(&choice.next_segment_id) {
                warnings.push(ValidationWarning::DanglingReference {
                    segment_id: segment.id.clone(),
                    choice_id: choice.id.clone(),
                    target_id: choice.next_segment_id.clone(),
                });
            }
        }
    }

    if !story.segments.iter().any(|s| s.is_authentic_path) {
        warnings.push(ValidationWarning::MissingCanonicalPath);
    }

    let root_id = story.segments[0].id.as_str();
    let reachable = reachable_from(&graph, root_id);
    for segment in &story.segments {
        if segment.id != root_id && !reachable.contains(segment.id.as_str()) {
            warnings.push(ValidationWarning::UnreachableSegment {
                segment_id: segment.id.clone(),
            });
        }
    }

    find_cycles(&graph, &mut warnings);

    for warning in &warnings {
        debug!(story_id = %story.id, %warning, "validation warning");
    }
    warnings
}

/// Human-readable form of [`validate_story`].
pub fn validation_messages(story: &Story) -> Vec<String> {
    validate_story(story)
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Ids reachable from `start` by following choices, `start` included.
/// Targets that do not resolve are recorded but not expanded.
pub fn reachable_from<'a>(graph: &StoryGraph<'a>, start: &'a str) -> FxHashSet<&'a str> {
    let mut reachable = FxHashSet::default();
    reachable.insert(start);
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        let Some(segment) = graph.get(current) else {
            continue;
        };
        for choice in &segment.choices {
            let target = choice.next_segment_id.as_str();
            if reachable.insert(target) {
                stack.push(target);
            }
        }
    }

    reachable
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    OnWalk,
    Done,
}

/// Depth-first walk from the root reporting every choice that targets a
/// segment still on the walk.
fn find_cycles(graph: &StoryGraph<'_>, warnings: &mut Vec<ValidationWarning>) {
    let segments = graph.segments();
    let mut marks = vec![Mark::Unseen; segments.len()];
    // (segment index, next choice to examine)
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    marks[0] = Mark::OnWalk;

    while let Some(top) = stack.last_mut() {
        let (current, next) = *top;
        let segment = &segments[current];

        if next >= segment.choices.len() {
            marks[current] = Mark::Done;
            stack.pop();
            continue;
        }
        top.1 += 1;

        let choice = &segment.choices[next];
        let Some(target) = graph.index_of(&choice.next_segment_id) else {
            continue;
        };
        match marks[target] {
            Mark::Unseen => {
                marks[target] = Mark::OnWalk;
                stack.push((target, 0));
            }
            Mark::OnWalk => warnings.push(ValidationWarning::Cycle {
                segment_id: segment.id.clone(),
                choice_id: choice.id.clone(),
                target_id: choice.next_segment_id.clone(),
            }),
            Mark::Done => {}
        }
    }
}
