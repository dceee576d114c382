/// Distinct-ending enumeration.
///
/// Two play-throughs are distinct when they differ in the sequence of
/// choice positions taken, not in the segments visited: two choices that
/// lead to the same ending are two paths.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::schema::story::Story;

/// Branch indices taken from the root to an ending.
///
/// Renders as `root-0-2-1`; the root of a single-segment story renders
/// as `root`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathSignature(pub Vec<usize>);

impl fmt::Display for PathSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for index in &self.0 {
            write!(f, "-{}", index)?;
        }
        Ok(())
    }
}

/// One reachable ending and the branch path that reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub signature: PathSignature,
    pub segment_id: String,
}

/// Enumerate every distinct ending reachable from the root, in
/// depth-first discovery order (choices taken in declared order).
///
/// A choice whose target does not exist is a dead end and contributes
/// nothing. A choice whose target is already on the current walk from
/// the root is also a dead end, so cyclic stories terminate.
pub fn distinct_endings(story: &Story) -> Vec<Ending> {
    let graph = story.graph();
    let segments = graph.segments();
    let mut endings = Vec::new();

    if segments.is_empty() {
        return endings;
    }

    let mut seen: FxHashSet<PathSignature> = FxHashSet::default();
    let mut record = |signature: &[usize], segment: usize, endings: &mut Vec<Ending>| {
        let signature = PathSignature(signature.to_vec());
        if seen.insert(signature.clone()) {
            endings.push(Ending {
                signature,
                segment_id: segments[segment].id.clone(),
            });
        }
    };

    if segments[0].is_ending() {
        record(&[], 0, &mut endings);
        return endings;
    }

    // Invariant: signature.len() == stack.len() - 1
    let mut signature: Vec<usize> = Vec::new();
    let mut on_walk: FxHashSet<usize> = FxHashSet::default();
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    on_walk.insert(0);

    while let Some(top) = stack.last_mut() {
        let (current, next) = *top;
        let segment = &segments[current];

        if next >= segment.choices.len() {
            on_walk.remove(&current);
            stack.pop();
            signature.truncate(stack.len().saturating_sub(1));
            continue;
        }
        top.1 += 1;

        let target_id = &segment.choices[next].next_segment_id;
        let Some(target) = graph.index_of(target_id) else {
            debug!(story_id = %story.id, segment = %segment.id, target = %target_id, "dangling choice treated as dead end");
            continue;
        };
        if on_walk.contains(&target) {
            debug!(story_id = %story.id, segment = %segment.id, target = %target_id, "loop treated as dead end");
            continue;
        }

        signature.push(next);
        if segments[target].is_ending() {
            record(&signature, target, &mut endings);
            signature.pop();
        } else {
            on_walk.insert(target);
            stack.push((target, 0));
        }
    }

    endings
}

/// Number of distinct endings; the denominator for completion.
pub fn count_distinct_endings(story: &Story) -> usize {
    distinct_endings(story).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{seg, story};

    fn signatures(story: &Story) -> Vec<String> {
        distinct_endings(story)
            .iter()
            .map(|e| e.signature.to_string())
            .collect()
    }

    #[test]
    fn two_endings_from_root() {
        let s = story(vec![seg("start", &["a", "b"]), seg("a", &[]), seg("b", &[])]);
        assert_eq!(count_distinct_endings(&s), 2);
        assert_eq!(signatures(&s), vec!["root-0", "root-1"]);
    }

    #[test]
    fn single_segment_story_is_one_ending() {
        let s = story(vec![seg("only", &[])]);
        let endings = distinct_endings(&s);
        assert_eq!(endings.len(), 1);
        assert_eq!(endings[0].signature.to_string(), "root");
        assert_eq!(endings[0].segment_id, "only");
    }

    #[test]
    fn empty_story_has_no_endings() {
        assert_eq!(count_distinct_endings(&story(vec![])), 0);
    }

    #[test]
    fn choices_to_same_ending_count_separately() {
        let s = story(vec![seg("start", &["end", "end"]), seg("end", &[])]);
        assert_eq!(count_distinct_endings(&s), 2);
    }

    #[test]
    fn convergent_paths_count_every_route() {
        // start -> {a, b} -> mid -> {x, y}
        let s = story(vec![
            seg("start", &["a", "b"]),
            seg("a", &["mid"]),
            seg("b", &["mid"]),
            seg("mid", &["x", "y"]),
            seg("x", &[]),
            seg("y", &[]),
        ]);
        assert_eq!(
            signatures(&s),
            vec!["root-0-0-0", "root-0-0-1", "root-1-0-0", "root-1-0-1"]
        );
        let endings = distinct_endings(&s);
        assert_eq!(endings[2].segment_id, "x");
    }

    #[test]
    fn dangling_branch_contributes_nothing() {
        let s = story(vec![seg("start", &["end", "missing"]), seg("end", &[])]);
        assert_eq!(signatures(&s), vec!["root-0"]);
    }

    #[test]
    fn unreachable_segments_do_not_count() {
        let s = story(vec![
            seg("start", &["end"]),
            seg("end", &[]),
            seg("orphan", &[]),
        ]);
        assert_eq!(count_distinct_endings(&s), 1);
    }

    #[test]
    fn loops_terminate_as_dead_ends() {
        let s = story(vec![
            seg("start", &["hall"]),
            seg("hall", &["start", "hall", "exit"]),
            seg("exit", &[]),
        ]);
        assert_eq!(signatures(&s), vec!["root-0-2"]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("s{}", i)).collect();
        let mut segments = Vec::with_capacity(ids.len());
        for pair in ids.windows(2) {
            segments.push(seg(&pair[0], &[pair[1].as_str()]));
        }
        segments.push(seg(&ids[ids.len() - 1], &[]));
        let s = story(segments);
        assert_eq!(count_distinct_endings(&s), 1);
    }

    #[test]
    fn signature_ordering_and_display() {
        assert_eq!(PathSignature(vec![1, 0, 3]).to_string(), "root-1-0-3");
        assert!(PathSignature(vec![0, 5]) < PathSignature(vec![1]));
    }
}
