//! The document tree.
//!
//! ## Why an Arena?
//!
//! Rich-text trees need parent links (to find the block around a caret)
//! and child links (to serialize). With `Rc<RefCell<_>>` both directions
//! fight the borrow checker. Storing every node in a map keyed by
//! `NodeId` and linking by id keeps ownership in one place:
//!
//! ```rust,ignore
//! let mut tree = DocumentTree::new();          // tree OWNS every node
//! let p = tree.append(tree.root(), NodeKind::Paragraph)?;
//! let run = tree.append(p, NodeKind::text("hi"))?;
//! tree.top_level_ancestor(run);                // Some(p), found via parent ids
//! ```

use serde::Serialize;
use std::collections::HashMap;

use crate::node::{Node, NodeId, NodeKind};
use crate::style::{StylePatch, TextStyle};
use crate::{DocError, DocResult};

/// Records that a text run was folded into another during normalization.
///
/// A point `(from, offset)` becomes `(to, offset + offset_shift)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRemap {
    pub from: NodeId,
    pub to: NodeId,
    pub offset_shift: usize,
}

/// Id-free structural snapshot of a subtree.
///
/// Two trees are structurally equivalent when their outlines are equal:
/// same node kinds, same text, same styles, same nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// An editable rich-text document.
///
/// # Ownership
///
/// The tree exclusively owns its root and all descendants. Callers hold
/// `NodeId`s, never references, so the tree can be mutated freely between
/// lookups.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl DocumentTree {
    /// Creates a tree holding only an empty root.
    ///
    /// # Example
    /// ```
    /// use scribe_doc::DocumentTree;
    ///
    /// let tree = DocumentTree::new();
    /// assert!(tree.is_empty());
    /// ```
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                id: root,
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    // ==================== Lookup ====================

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns true if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node(&self, id: NodeId) -> DocResult<&Node> {
        self.nodes.get(&id).ok_or(DocError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DocResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(DocError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of a node; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of a node among its siblings.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Ancestors from the parent upward, root last.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// Walks parent links to the nearest child of the root.
    ///
    /// Returns `None` for the root itself and for detached nodes.
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Nearest ancestor-or-self satisfying a predicate.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.kind(*n).is_some_and(&pred))
    }

    /// Child indices leading from the root to `id`.
    pub fn path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Pre-order traversal of a subtree, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Every text run in document order.
    pub fn text_runs(&self) -> Vec<NodeId> {
        self.text_runs_under(self.root)
    }

    /// Text runs within a subtree, in document order.
    pub fn text_runs_under(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.kind(*n), Some(NodeKind::TextRun { .. })))
            .collect()
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_runs_under(id)
            .into_iter()
            .filter_map(|run| self.get(run).and_then(Node::text))
            .collect()
    }

    /// Length of a run in characters; 0 for element nodes.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.get(id)
            .and_then(Node::text)
            .map(|t| t.chars().count())
            .unwrap_or(0)
    }

    // ==================== Structure ====================

    /// Allocates a detached node.
    ///
    /// Fails with a validation error on invalid attributes, or when asked
    /// for a second root.
    pub fn create_node(&mut self, kind: NodeKind) -> DocResult<NodeId> {
        if kind == NodeKind::Root {
            return Err(DocError::Validation(
                "a document has exactly one root".to_string(),
            ));
        }
        kind.validate()?;

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Creates a node and appends it under `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> DocResult<NodeId> {
        let id = self.create_node(kind)?;
        if let Err(e) = self.append_child(parent, id) {
            self.nodes.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DocResult<()> {
        let len = self.node(parent)?.children.len();
        self.insert_child(parent, len, child)
    }

    /// Inserts a detached node at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DocResult<()> {
        let child_node = self.node(child)?;
        if child_node.parent.is_some() || child == self.root {
            return Err(DocError::InvalidStructure(format!(
                "{child} is already attached"
            )));
        }
        let child_kind = child_node.kind.clone();

        let parent_node = self.node(parent)?;
        if !parent_node.kind.accepts_child(&child_kind) {
            return Err(DocError::InvalidStructure(format!(
                "{} cannot contain {}",
                parent_node.kind.name(),
                child_kind.name()
            )));
        }
        if index > parent_node.children.len() {
            return Err(DocError::InvalidStructure(format!(
                "child index {index} out of range for {parent}"
            )));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(DocError::InvalidStructure(format!(
                "inserting {child} under {parent} would create a cycle"
            )));
        }

        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlinks a node from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: NodeId) -> DocResult<()> {
        if id == self.root {
            return Err(DocError::InvalidStructure(
                "the root cannot be detached".to_string(),
            ));
        }
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detaches a node and drops its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> DocResult<()> {
        self.detach(id)?;
        for node in self.descendants(id) {
            self.nodes.remove(&node);
        }
        Ok(())
    }

    /// Moves every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> DocResult<()> {
        for child in self.children(from).to_vec() {
            self.detach(child)?;
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Changes a node's kind in place, keeping its id and children.
    ///
    /// Rejected if the parent would not accept the new kind or the new kind
    /// would not accept the existing children.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> DocResult<()> {
        if id == self.root || kind == NodeKind::Root {
            return Err(DocError::InvalidStructure(
                "the root kind is fixed".to_string(),
            ));
        }
        kind.validate()?;

        if let Some(parent) = self.parent(id) {
            let parent_kind = &self.node(parent)?.kind;
            if !parent_kind.accepts_child(&kind) {
                return Err(DocError::InvalidStructure(format!(
                    "{} cannot contain {}",
                    parent_kind.name(),
                    kind.name()
                )));
            }
        }
        for child in self.children(id) {
            let child_kind = &self.node(*child)?.kind;
            if !kind.accepts_child(child_kind) {
                return Err(DocError::InvalidStructure(format!(
                    "{} cannot contain {}",
                    kind.name(),
                    child_kind.name()
                )));
            }
        }

        self.node_mut(id)?.kind = kind;
        Ok(())
    }

    /// Removes every child of the root.
    pub fn clear(&mut self) {
        for child in self.children(self.root).to_vec() {
            // Children of the root are always attached; removal cannot fail.
            let _ = self.remove(child);
        }
    }

    // ==================== Text & Style ====================

    /// Replaces the text of a run.
    pub fn set_text(&mut self, id: NodeId, new_text: impl Into<String>) -> DocResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::TextRun { text, .. } => {
                *text = new_text.into();
                Ok(())
            }
            other => Err(DocError::InvalidStructure(format!(
                "{id} is a {}, not a text run",
                other.name()
            ))),
        }
    }

    /// Merges a style patch onto a text run.
    ///
    /// No-op (returns false) if the node is missing or not a run.
    pub fn set_style(&mut self, id: NodeId, patch: &StylePatch) -> bool {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::TextRun { style, .. }) => style.apply(patch),
            _ => false,
        }
    }

    /// Resets the style of every text run under the given nodes.
    ///
    /// Block kinds are untouched. Returns true if any run changed.
    pub fn clear_formatting(&mut self, ids: &[NodeId]) -> bool {
        let mut changed = false;
        for id in ids {
            for run in self.text_runs_under(*id) {
                if let Some(NodeKind::TextRun { style, .. }) =
                    self.nodes.get_mut(&run).map(|n| &mut n.kind)
                {
                    if !style.is_plain() {
                        *style = TextStyle::default();
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// Splits a run at a character offset.
    ///
    /// The original node keeps `[0, offset)`; a new sibling with the same
    /// style receives `[offset, len)` and its id is returned.
    pub fn split_run(&mut self, id: NodeId, offset: usize) -> DocResult<NodeId> {
        let (text, style) = match &self.node(id)?.kind {
            NodeKind::TextRun { text, style } => (text.clone(), style.clone()),
            other => {
                return Err(DocError::InvalidStructure(format!(
                    "cannot split a {}",
                    other.name()
                )));
            }
        };
        let len = text.chars().count();
        let byte = byte_offset(&text, offset).ok_or(DocError::OffsetOutOfBounds {
            node: id,
            offset,
            len,
        })?;

        let parent = self
            .parent(id)
            .ok_or_else(|| DocError::InvalidStructure(format!("{id} is detached")))?;
        let index = self.index_in_parent(id).unwrap_or(0);

        self.set_text(id, &text[..byte])?;
        let right = self.create_node(NodeKind::styled_text(&text[byte..], style))?;
        self.insert_child(parent, index + 1, right)?;
        Ok(right)
    }

    /// Inserts text into a run at a character offset.
    pub fn insert_text(&mut self, id: NodeId, offset: usize, insert: &str) -> DocResult<()> {
        let text = self
            .get(id)
            .and_then(Node::text)
            .ok_or_else(|| DocError::InvalidStructure(format!("{id} is not a text run")))?
            .to_string();
        let len = text.chars().count();
        let byte = byte_offset(&text, offset).ok_or(DocError::OffsetOutOfBounds {
            node: id,
            offset,
            len,
        })?;
        let mut updated = text;
        updated.insert_str(byte, insert);
        self.set_text(id, updated)
    }

    // ==================== Normal Form ====================

    /// Brings the whole tree into normal form.
    ///
    /// Adjacent runs with equal style are merged and empty runs dropped in
    /// every container. The returned remaps let callers move selection
    /// points off nodes that disappeared.
    pub fn normalize(&mut self) -> Vec<RunRemap> {
        let containers: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .filter(|n| {
                self.children(*n)
                    .iter()
                    .any(|c| matches!(self.kind(*c), Some(NodeKind::TextRun { .. })))
            })
            .collect();

        let mut remaps = Vec::new();
        for container in containers {
            remaps.extend(self.merge_adjacent_runs(container));
        }
        remaps
    }

    /// Merges equal-style neighbouring runs under one parent.
    pub fn merge_adjacent_runs(&mut self, parent: NodeId) -> Vec<RunRemap> {
        let mut remaps = Vec::new();
        let children = self.children(parent).to_vec();
        let mut previous: Option<NodeId> = None;

        for child in children {
            let Some(NodeKind::TextRun { text, style }) = self.kind(child).cloned() else {
                previous = None;
                continue;
            };

            if text.is_empty() {
                let target = previous
                    .map(|p| (p, self.text_len(p)))
                    .or_else(|| {
                        self.next_sibling(child)
                            .filter(|n| matches!(self.kind(*n), Some(NodeKind::TextRun { .. })))
                            .map(|n| (n, 0))
                    })
                    .unwrap_or((parent, 0));
                remaps.push(RunRemap {
                    from: child,
                    to: target.0,
                    offset_shift: target.1,
                });
                let _ = self.remove(child);
                continue;
            }

            if let Some(prev) = previous {
                if self.get(prev).and_then(Node::style) == Some(&style) {
                    let shift = self.text_len(prev);
                    let merged = format!("{}{}", self.get(prev).and_then(Node::text).unwrap_or(""), text);
                    let _ = self.set_text(prev, merged);
                    let _ = self.remove(child);
                    remaps.push(RunRemap {
                        from: child,
                        to: prev,
                        offset_shift: shift,
                    });
                    continue;
                }
            }
            previous = Some(child);
        }

        // Remaps pointing at runs that were themselves merged later must be
        // resolved transitively.
        let snapshot = remaps.clone();
        for remap in &mut remaps {
            while let Some(next) = snapshot.iter().find(|r| r.from == remap.to) {
                remap.to = next.to;
                remap.offset_shift += next.offset_shift;
            }
        }
        remaps
    }

    // ==================== Snapshots ====================

    /// Id-free outline of the root's children.
    pub fn outline(&self) -> Vec<OutlineNode> {
        self.children(self.root)
            .iter()
            .map(|c| self.outline_of(*c))
            .collect()
    }

    /// Id-free outline of one subtree.
    pub fn outline_of(&self, id: NodeId) -> OutlineNode {
        OutlineNode {
            kind: self.kind(id).cloned().unwrap_or(NodeKind::Root),
            children: self
                .children(id)
                .iter()
                .map(|c| self.outline_of(*c))
                .collect(),
        }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a character offset to a byte offset (end of text allowed).
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FormatFlag;

    fn paragraph(tree: &mut DocumentTree, runs: &[(&str, TextStyle)]) -> NodeId {
        let p = tree.append(tree.root(), NodeKind::Paragraph).unwrap();
        for (text, style) in runs {
            tree.append(p, NodeKind::styled_text(*text, style.clone()))
                .unwrap();
        }
        p
    }

    #[test]
    fn test_create_node_validation() {
        let mut tree = DocumentTree::new();
        assert!(tree.create_node(NodeKind::Root).is_err());
        assert!(tree.create_node(NodeKind::link("")).is_err());
        assert!(tree.create_node(NodeKind::heading(2).unwrap()).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut tree = DocumentTree::new();
        let a = tree.create_node(NodeKind::Paragraph).unwrap();
        let b = tree.create_node(NodeKind::Paragraph).unwrap();
        tree.remove(a).unwrap();
        let c = tree.create_node(NodeKind::Paragraph).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_list_item_only_under_list() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        assert!(tree.append(root, NodeKind::ListItem).is_err());
        let list = tree.append(root, NodeKind::ListUnordered).unwrap();
        assert!(tree.append(list, NodeKind::Paragraph).is_err());
        let item = tree.append(list, NodeKind::ListItem).unwrap();
        assert!(tree.append(item, NodeKind::ListOrdered).is_ok());
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DocumentTree::new();
        let list = tree.append(tree.root(), NodeKind::ListUnordered).unwrap();
        let item = tree.append(list, NodeKind::ListItem).unwrap();
        let nested = tree.append(item, NodeKind::ListUnordered).unwrap();
        tree.detach(list).unwrap();
        let inner_item = tree.append(nested, NodeKind::ListItem).unwrap();
        assert!(tree.append_child(inner_item, list).is_err());
    }

    #[test]
    fn test_top_level_ancestor() {
        let mut tree = DocumentTree::new();
        let list = tree.append(tree.root(), NodeKind::ListOrdered).unwrap();
        let item = tree.append(list, NodeKind::ListItem).unwrap();
        let run = tree.append(item, NodeKind::text("x")).unwrap();
        assert_eq!(tree.top_level_ancestor(run), Some(list));
        assert_eq!(tree.top_level_ancestor(list), Some(list));
        assert_eq!(tree.top_level_ancestor(tree.root()), None);
    }

    #[test]
    fn test_set_style_ignores_elements() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, &[("a", TextStyle::default())]);
        assert!(!tree.set_style(p, &StylePatch::flag(FormatFlag::Bold, true)));
        let run = tree.children(p)[0];
        assert!(tree.set_style(run, &StylePatch::flag(FormatFlag::Bold, true)));
        assert!(tree.get(run).unwrap().style().unwrap().flags.bold);
    }

    #[test]
    fn test_clear_formatting_keeps_block_kind() {
        let mut tree = DocumentTree::new();
        let h = tree
            .append(tree.root(), NodeKind::heading(2).unwrap())
            .unwrap();
        tree.append(h, NodeKind::styled_text("t", TextStyle::bold()))
            .unwrap();
        assert!(tree.clear_formatting(&[h]));
        assert_eq!(tree.kind(h), Some(&NodeKind::heading(2).unwrap()));
        assert!(tree.text_runs().iter().all(|r| tree.get(*r).unwrap().style().unwrap().is_plain()));
    }

    #[test]
    fn test_split_and_normalize() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, &[("héllo", TextStyle::default())]);
        let run = tree.children(p)[0];
        let right = tree.split_run(run, 2).unwrap();
        assert_eq!(tree.get(run).unwrap().text(), Some("hé"));
        assert_eq!(tree.get(right).unwrap().text(), Some("llo"));

        let remaps = tree.normalize();
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(
            remaps,
            vec![RunRemap {
                from: right,
                to: run,
                offset_shift: 2
            }]
        );
        assert_eq!(tree.text_content(p), "héllo");
    }

    #[test]
    fn test_split_out_of_bounds() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, &[("ab", TextStyle::default())]);
        let run = tree.children(p)[0];
        assert!(matches!(
            tree.split_run(run, 3),
            Err(DocError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_transitive_merge_remap() {
        let mut tree = DocumentTree::new();
        let plain = TextStyle::default();
        let p = paragraph(&mut tree, &[("a", plain.clone()), ("b", plain.clone()), ("c", plain)]);
        let ids = tree.children(p).to_vec();
        let remaps = tree.normalize();
        assert_eq!(tree.text_content(p), "abc");
        let last = remaps.iter().find(|r| r.from == ids[2]).unwrap();
        assert_eq!(last.to, ids[0]);
        assert_eq!(last.offset_shift, 2);
    }

    #[test]
    fn test_set_kind_checks_children() {
        let mut tree = DocumentTree::new();
        let p = paragraph(&mut tree, &[("a", TextStyle::default())]);
        assert!(tree.set_kind(p, NodeKind::Quote).is_ok());
        assert!(tree.set_kind(p, NodeKind::ListUnordered).is_err());
    }

    #[test]
    fn test_outline_ignores_ids() {
        let mut a = DocumentTree::new();
        paragraph(&mut a, &[("x", TextStyle::bold())]);
        let mut b = DocumentTree::new();
        b.create_node(NodeKind::Quote).unwrap();
        paragraph(&mut b, &[("x", TextStyle::bold())]);
        assert_eq!(a.outline(), b.outline());
    }
}
