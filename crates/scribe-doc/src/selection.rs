//! Selection points and ranges.
//!
//! ## Learning: Points, not Positions
//!
//! A plain-text editor can address text with line/column pairs. A tree
//! editor cannot: the same character offset means different things in
//! different runs. A `Point` therefore names a node plus an offset:
//!
//! - on a text run, the offset counts characters;
//! - on an element, offset 0 is the start of the element and any other
//!   offset is its end.
//!
//! Points are compared by their document-order key (child-index path plus
//! offset), which is cheap to compute and total.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::node::{NodeId, NodeKind};
use crate::tree::{DocumentTree, RunRemap};

/// A location in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Document-order key, or `None` if the node is not attached.
    fn key(&self, tree: &DocumentTree) -> Option<Vec<usize>> {
        let mut key = tree.path(self.node)?;
        match tree.kind(self.node)? {
            NodeKind::TextRun { .. } => key.push(self.offset),
            _ if self.offset == 0 => {}
            _ => key.push(tree.children(self.node).len()),
        }
        Some(key)
    }

    /// Moves the point along a normalization remap.
    pub fn remap(&mut self, remap: &RunRemap) {
        if self.node == remap.from {
            self.node = remap.to;
            self.offset += remap.offset_shift;
        }
    }
}

/// The user's selection: where it started (anchor) and where the caret is
/// (focus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// A collapsed selection (caret).
    pub fn caret(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    /// Returns true if anchor and focus coincide.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Returns true if both points still address attached nodes.
    pub fn is_valid(&self, tree: &DocumentTree) -> bool {
        self.anchor.key(tree).is_some() && self.focus.key(tree).is_some()
    }

    /// Applies normalization remaps to both points.
    pub fn remap(&mut self, remaps: &[RunRemap]) {
        for remap in remaps {
            self.anchor.remap(remap);
            self.focus.remap(remap);
        }
    }

    /// Orders the points in document order.
    ///
    /// Returns `None` if either point is dangling.
    pub fn resolve(&self, tree: &DocumentTree) -> Option<ResolvedRange> {
        let anchor_key = self.anchor.key(tree)?;
        let focus_key = self.focus.key(tree)?;
        let backward = focus_key.cmp(&anchor_key) == Ordering::Less;
        let (start, end, start_key, end_key) = if backward {
            (self.focus, self.anchor, focus_key, anchor_key)
        } else {
            (self.anchor, self.focus, anchor_key, focus_key)
        };
        Some(ResolvedRange {
            start,
            end,
            start_key,
            end_key,
            backward,
        })
    }
}

/// A selection with its points in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: Point,
    pub end: Point,
    start_key: Vec<usize>,
    end_key: Vec<usize>,
    /// True if the focus precedes the anchor.
    pub backward: bool,
}

/// The selected character span of one text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSlice {
    pub run: NodeId,
    pub start: usize,
    pub end: usize,
    /// Full length of the run in characters.
    pub len: usize,
}

impl RunSlice {
    /// Returns true if the slice covers the whole run.
    pub fn is_whole(&self) -> bool {
        self.start == 0 && self.end == self.len
    }
}

impl ResolvedRange {
    pub fn is_collapsed(&self) -> bool {
        self.start_key == self.end_key
    }

    /// Text runs overlapping the range with a non-empty span.
    ///
    /// A collapsed range overlaps nothing.
    pub fn run_slices(&self, tree: &DocumentTree) -> Vec<RunSlice> {
        if self.is_collapsed() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for run in tree.text_runs() {
            let Some(path) = tree.path(run) else {
                continue;
            };
            let len = tree.text_len(run);

            let mut run_start = path.clone();
            run_start.push(0);
            let mut run_end = path;
            run_end.push(len);

            if run_end <= self.start_key || run_start >= self.end_key {
                continue;
            }

            let start = if self.start.node == run {
                self.start.offset.min(len)
            } else {
                0
            };
            let end = if self.end.node == run {
                self.end.offset.min(len)
            } else {
                len
            };
            if start < end {
                out.push(RunSlice {
                    run,
                    start,
                    end,
                    len,
                });
            }
        }
        out
    }

    /// Children of the root touched by the range, in document order.
    ///
    /// A caret touches the block it sits in.
    pub fn top_level_blocks(&self, tree: &DocumentTree) -> Vec<NodeId> {
        let first = tree.top_level_ancestor(self.start.node);
        let last = tree.top_level_ancestor(self.end.node);
        let (Some(first), Some(last)) = (first, last) else {
            return Vec::new();
        };
        let blocks = tree.children(tree.root());
        let from = blocks.iter().position(|b| *b == first);
        let to = blocks.iter().position(|b| *b == last);
        match (from, to) {
            (Some(from), Some(to)) if from <= to => blocks[from..=to].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Nearest list items around every node the range touches.
    pub fn list_items(&self, tree: &DocumentTree) -> Vec<NodeId> {
        let mut nodes = vec![self.start.node];
        nodes.extend(self.run_slices(tree).into_iter().map(|s| s.run));
        nodes.push(self.end.node);

        let mut items = Vec::new();
        for node in nodes {
            if let Some(item) = tree.closest(node, |k| *k == NodeKind::ListItem) {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    fn two_paragraphs() -> (DocumentTree, NodeId, NodeId) {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let p1 = tree.append(root, NodeKind::Paragraph).unwrap();
        let a = tree.append(p1, NodeKind::text("hello")).unwrap();
        let p2 = tree.append(root, NodeKind::Paragraph).unwrap();
        let b = tree
            .append(p2, NodeKind::styled_text("world", TextStyle::bold()))
            .unwrap();
        (tree, a, b)
    }

    #[test]
    fn test_backward_selection_is_ordered() {
        let (tree, a, b) = two_paragraphs();
        let sel = Selection::new(Point::new(b, 2), Point::new(a, 1));
        let range = sel.resolve(&tree).unwrap();
        assert!(range.backward);
        assert_eq!(range.start, Point::new(a, 1));
        assert_eq!(range.end, Point::new(b, 2));
    }

    #[test]
    fn test_run_slices_partial() {
        let (tree, a, b) = two_paragraphs();
        let range = Selection::new(Point::new(a, 3), Point::new(b, 2))
            .resolve(&tree)
            .unwrap();
        let slices = range.run_slices(&tree);
        assert_eq!(slices.len(), 2);
        assert_eq!((slices[0].start, slices[0].end), (3, 5));
        assert_eq!((slices[1].start, slices[1].end), (0, 2));
    }

    #[test]
    fn test_slice_at_run_boundary_is_excluded() {
        let (tree, a, b) = two_paragraphs();
        let range = Selection::new(Point::new(a, 5), Point::new(b, 5))
            .resolve(&tree)
            .unwrap();
        let slices = range.run_slices(&tree);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].run, b);
        assert!(slices[0].is_whole());
    }

    #[test]
    fn test_caret_touches_its_block() {
        let (tree, a, _) = two_paragraphs();
        let range = Selection::caret(Point::new(a, 2)).resolve(&tree).unwrap();
        assert!(range.is_collapsed());
        assert!(range.run_slices(&tree).is_empty());
        assert_eq!(range.top_level_blocks(&tree).len(), 1);
    }

    #[test]
    fn test_element_points() {
        let (tree, a, b) = two_paragraphs();
        let p1 = tree.parent(a).unwrap();
        let p2 = tree.parent(b).unwrap();
        let range = Selection::new(Point::new(p1, 0), Point::new(p2, 1))
            .resolve(&tree)
            .unwrap();
        assert_eq!(range.run_slices(&tree).len(), 2);
    }

    #[test]
    fn test_dangling_point() {
        let (mut tree, a, b) = two_paragraphs();
        tree.remove(tree.parent(a).unwrap()).unwrap();
        let sel = Selection::new(Point::new(a, 0), Point::new(b, 1));
        assert!(!sel.is_valid(&tree));
        assert!(sel.resolve(&tree).is_none());
    }
}
