/// Reader progress transitions.
///
/// Every mutation of a [`ProgressRecord`] goes through this module. The
/// functions are total over validated input and perform no I/O; loading
/// and saving the record is the host's job. A record must not be shared
/// between concurrent writers.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use crate::schema::bookmark::Bookmark;
use crate::schema::progress::ProgressRecord;
use crate::schema::story::{Choice, Segment, Story};

/// Separator used when joining history into a completed-path signature.
/// Segment ids are expected not to contain it.
pub const PATH_SEPARATOR: &str = "-";

/// Start a fresh record positioned at `root_id`.
pub fn initialize(story: &Story, root_id: &str) -> ProgressRecord {
    initialize_at(story, root_id, Utc::now())
}

pub fn initialize_at(story: &Story, root_id: &str, now: DateTime<Utc>) -> ProgressRecord {
    debug!(story_id = %story.id, root = root_id, "progress initialized");
    ProgressRecord {
        story_id: story.id.clone(),
        current_segment_id: root_id.to_string(),
        history: vec![root_id.to_string()],
        visited_segments: BTreeSet::from([root_id.to_string()]),
        completed_paths: BTreeSet::new(),
        last_activity: now,
        completion: 0.0,
    }
}

/// Move the reader along `choice`.
pub fn record_choice(record: &mut ProgressRecord, choice: &Choice) {
    record_choice_at(record, choice, Utc::now());
}

pub fn record_choice_at(record: &mut ProgressRecord, choice: &Choice, now: DateTime<Utc>) {
    let target = &choice.next_segment_id;
    if !record.history.iter().any(|id| id == target) {
        record.history.push(target.clone());
    }
    record.visited_segments.insert(target.clone());
    record.current_segment_id = target.clone();
    record.last_activity = now;
    debug!(
        story_id = %record.story_id,
        choice = %choice.id,
        segment = %target,
        "choice recorded"
    );
}

/// If `current_segment` is an ending, record the reader's path as
/// completed and refresh the completion fraction. Returns whether the
/// segment was an ending.
///
/// The signature is the history joined with [`PATH_SEPARATOR`]. Ids that
/// contain the separator can make two different routes share a signature,
/// in which case they count as one discovered ending.
pub fn check_and_mark_ending(
    record: &mut ProgressRecord,
    current_segment: &Segment,
    total_endings: usize,
) -> bool {
    if !current_segment.is_ending() {
        return false;
    }

    let signature = record.history.join(PATH_SEPARATOR);
    if record.completed_paths.insert(signature) {
        debug!(
            story_id = %record.story_id,
            ending = %current_segment.id,
            discovered = record.completed_paths.len(),
            "new ending reached"
        );
    }
    record.completion = completion_fraction(record.completed_paths.len(), total_endings);
    true
}

/// Send the reader back to the start. Completed paths and the visited
/// set are kept.
pub fn restart(record: &mut ProgressRecord, root_id: &str) {
    record.current_segment_id = root_id.to_string();
    record.history = vec![root_id.to_string()];
    debug!(story_id = %record.story_id, "progress restarted");
}

/// Jump to a bookmarked position. The bookmarked history replaces the
/// current one and is folded into the visited set; completed paths are
/// untouched.
pub fn restore_bookmark(record: &mut ProgressRecord, bookmark: &Bookmark) {
    restore_bookmark_at(record, bookmark, Utc::now());
}

pub fn restore_bookmark_at(record: &mut ProgressRecord, bookmark: &Bookmark, now: DateTime<Utc>) {
    record.current_segment_id = bookmark.segment_id.clone();
    record.history = bookmark.path_history.clone();
    record
        .visited_segments
        .extend(bookmark.path_history.iter().cloned());
    record.visited_segments.insert(bookmark.segment_id.clone());
    record.last_activity = now;
    debug!(story_id = %record.story_id, segment = %bookmark.segment_id, "bookmark restored");
}

/// `completed / total`, 0.0 for a story with no endings, capped at 1.0.
pub fn completion_fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64).min(1.0)
}
