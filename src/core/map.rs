/// Layout-agnostic tree decomposition of a story for external renderers.
///
/// The graph is laid out as a tree: a segment reachable along several
/// routes is placed once, under whichever parent reaches it first in
/// document order, and later encounters are skipped. That is fine for
/// display but means the map must not be used for counting.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::graph::StoryGraph;
use crate::schema::story::{Choice, Segment, Story};

/// An outgoing edge as drawn from its parent node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEdge {
    pub choice_id: String,
    pub target_id: String,
    pub is_authentic_path: bool,
}

/// One placed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapNode {
    pub segment_id: String,
    /// Hops from the root along the tree (root = 0).
    pub depth: usize,
    /// Horizontal slot, centered over the node's leaf descendants.
    pub position: usize,
    /// Number of leaf slots the node's subtree occupies.
    pub width: usize,
    pub is_start: bool,
    pub is_ending: bool,
    /// The reader has visited this segment, when a visited set was given.
    pub explored: bool,
    pub edges: Vec<MapEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMap {
    /// Nodes in placement (pre-order) order; the root is first.
    pub nodes: Vec<MapNode>,
}

impl StoryMap {
    pub fn node(&self, segment_id: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.segment_id == segment_id)
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn max_position(&self) -> usize {
        self.nodes.iter().map(|n| n.position).max().unwrap_or(0)
    }

    /// `(parent, child)` pairs whose both ends were placed.
    pub fn drawable_edges(&self) -> Vec<(&MapNode, &MapNode)> {
        let placed: FxHashMap<&str, &MapNode> = self
            .nodes
            .iter()
            .map(|n| (n.segment_id.as_str(), n))
            .collect();
        let mut pairs = Vec::new();
        for parent in &self.nodes {
            for edge in &parent.edges {
                if let Some(child) = placed.get(edge.target_id.as_str()) {
                    pairs.push((parent, *child));
                }
            }
        }
        pairs
    }
}

/// Build the map for `story`, shading nodes found in `visited`.
pub fn build_map(story: &Story, visited: Option<&BTreeSet<String>>) -> StoryMap {
    let graph = story.graph();
    let Some(root) = story.segments.first() else {
        return StoryMap::default();
    };

    let widths = subtree_widths(&graph, &root.id);
    let mut layout = Layout {
        graph: &graph,
        widths: &widths,
        visited,
        root_id: &root.id,
        placed: FxHashSet::default(),
        nodes: Vec::new(),
    };
    layout.place_from(&root.id);

    StoryMap {
        nodes: layout.nodes,
    }
}

/// Leaf count under every expanded segment, first visit only. A segment
/// already expanded elsewhere, or missing from the story, counts as one
/// slot and gets no entry.
fn subtree_widths<'a>(graph: &StoryGraph<'a>, root: &'a str) -> FxHashMap<&'a str, usize> {
    let mut widths = FxHashMap::default();
    let mut seen = FxHashSet::default();
    // (segment id, remaining choices, leaves counted so far)
    let mut stack: Vec<(&'a str, std::slice::Iter<'a, Choice>, usize)> = Vec::new();

    if let Some(segment) = expand(graph, root, &mut seen, &mut widths) {
        stack.push((segment.id.as_str(), segment.choices.iter(), 0));
    }

    while let Some(frame) = stack.last_mut() {
        match frame.1.next() {
            Some(choice) => {
                let child = choice.next_segment_id.as_str();
                match expand(graph, child, &mut seen, &mut widths) {
                    Some(segment) => stack.push((segment.id.as_str(), segment.choices.iter(), 0)),
                    None => frame.2 += 1,
                }
            }
            None => {
                let (id, width) = (frame.0, frame.2);
                stack.pop();
                widths.insert(id, width);
                if let Some(parent) = stack.last_mut() {
                    parent.2 += width;
                }
            }
        }
    }
    widths
}

/// First visit to `id` in the width pass. Returns the segment when its
/// children still need counting; `None` means it occupies one slot.
fn expand<'a>(
    graph: &StoryGraph<'a>,
    id: &'a str,
    seen: &mut FxHashSet<&'a str>,
    widths: &mut FxHashMap<&'a str, usize>,
) -> Option<&'a Segment> {
    if !seen.insert(id) {
        return None;
    }
    let segment = graph.get(id)?;
    if segment.is_ending() {
        widths.insert(id, 1);
        return None;
    }
    Some(segment)
}

struct Layout<'g, 'a> {
    graph: &'g StoryGraph<'a>,
    widths: &'g FxHashMap<&'a str, usize>,
    visited: Option<&'g BTreeSet<String>>,
    root_id: &'a str,
    placed: FxHashSet<&'a str>,
    nodes: Vec<MapNode>,
}

impl<'g, 'a> Layout<'g, 'a> {
    fn width_of(&self, id: &str) -> usize {
        self.widths.get(id).copied().unwrap_or(1)
    }

    /// Pre-order placement. Each child starts at its parent's running
    /// offset, which then advances by the child's width.
    fn place_from(&mut self, root: &'a str) {
        // (remaining choices, depth, next child's left edge)
        let mut stack: Vec<(std::slice::Iter<'a, Choice>, usize, usize)> = Vec::new();
        if let Some(segment) = self.place(root, 0, 0) {
            stack.push((segment.choices.iter(), 0, 0));
        }

        while let Some(frame) = stack.last_mut() {
            let Some(choice) = frame.0.next() else {
                stack.pop();
                continue;
            };
            let child = choice.next_segment_id.as_str();
            let (depth, left) = (frame.1 + 1, frame.2);
            frame.2 += self.width_of(child);
            if let Some(segment) = self.place(child, depth, left) {
                stack.push((segment.choices.iter(), depth, left));
            }
        }
    }

    /// Place `id` unless it was placed already or is missing.
    fn place(&mut self, id: &'a str, depth: usize, left: usize) -> Option<&'a Segment> {
        if !self.placed.insert(id) {
            return None;
        }
        let segment = self.graph.get(id)?;

        let width = self.width_of(id);
        self.nodes.push(MapNode {
            segment_id: segment.id.clone(),
            depth,
            position: left + width / 2,
            width,
            is_start: id == self.root_id,
            is_ending: segment.is_ending(),
            explored: self.visited.is_some_and(|v| v.contains(id)),
            edges: segment
                .choices
                .iter()
                .map(|c| MapEdge {
                    choice_id: c.id.clone(),
                    target_id: c.next_segment_id.clone(),
                    is_authentic_path: c.is_authentic_path,
                })
                .collect(),
        });
        Some(segment)
    }
}
