//! Content node kinds and identifiers.
//!
//! ## Learning: Closed Enums over Type Strings
//!
//! Every node carries a `NodeKind`. Because the enum is closed, a `match`
//! over it is checked for exhaustiveness by the compiler: adding a variant
//! forces every serializer, walker and toolbar rule to handle it.

use serde::{Deserialize, Serialize};

use crate::style::TextStyle;
use crate::{DocError, DocResult};

/// Identifier of a node, unique within one document tree.
///
/// Ids are handed out by a per-tree counter and never reused, so a stale id
/// simply stops resolving after its node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Returns the raw numeric value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A heading level, guaranteed to be within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Creates a heading level, rejecting values outside `1..=6`.
    pub fn new(level: u8) -> DocResult<Self> {
        if (1..=6).contains(&level) {
            Ok(Self(level))
        } else {
            Err(DocError::Validation(format!(
                "heading level {level} is outside 1..=6"
            )))
        }
    }

    /// Returns the numeric level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns the matching HTML tag name (`h1`..`h6`).
    pub fn tag(self) -> &'static str {
        match self.0 {
            1 => "h1",
            2 => "h2",
            3 => "h3",
            4 => "h4",
            5 => "h5",
            _ => "h6",
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = DocError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// The kind of a content node, with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// The document root. Exactly one per tree.
    Root,
    Paragraph,
    Heading { level: HeadingLevel },
    Quote,
    CodeBlock,
    ListOrdered,
    ListUnordered,
    /// Only valid as a direct child of a list node.
    ListItem,
    Link { href: String },
    /// Leaf holding literal text and inline style.
    TextRun { text: String, style: TextStyle },
}

impl NodeKind {
    /// Convenience constructor for a heading that validates the level.
    pub fn heading(level: u8) -> DocResult<Self> {
        Ok(NodeKind::Heading {
            level: HeadingLevel::new(level)?,
        })
    }

    /// Creates an unstyled text run.
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::TextRun {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Creates a text run with a style.
    pub fn styled_text(text: impl Into<String>, style: TextStyle) -> Self {
        NodeKind::TextRun {
            text: text.into(),
            style,
        }
    }

    /// Creates a link node.
    pub fn link(href: impl Into<String>) -> Self {
        NodeKind::Link { href: href.into() }
    }

    /// Checks attribute-level invariants.
    pub fn validate(&self) -> DocResult<()> {
        match self {
            NodeKind::Link { href } if href.trim().is_empty() => Err(DocError::Validation(
                "link href must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns true for paragraph-level nodes that may sit under the root.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::Quote
                | NodeKind::CodeBlock
                | NodeKind::ListOrdered
                | NodeKind::ListUnordered
        )
    }

    /// Returns true for list container nodes.
    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::ListOrdered | NodeKind::ListUnordered)
    }

    /// Returns true for nodes that live inside blocks.
    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::Link { .. } | NodeKind::TextRun { .. })
    }

    /// Returns true for blocks whose children are inline content.
    pub fn holds_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::Quote
                | NodeKind::CodeBlock
                | NodeKind::ListItem
                | NodeKind::Link { .. }
        )
    }

    /// Returns true if a node of kind `child` may be placed under `self`.
    pub fn accepts_child(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Root => child.is_block(),
            NodeKind::ListOrdered | NodeKind::ListUnordered => *child == NodeKind::ListItem,
            NodeKind::ListItem => child.is_inline() || child.is_list(),
            NodeKind::Link { .. } => matches!(child, NodeKind::TextRun { .. }),
            NodeKind::Paragraph
            | NodeKind::Heading { .. }
            | NodeKind::Quote
            | NodeKind::CodeBlock => child.is_inline(),
            NodeKind::TextRun { .. } => false,
        }
    }

    /// Short name used in logs and outlines.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Quote => "quote",
            NodeKind::CodeBlock => "code",
            NodeKind::ListOrdered => "list-ordered",
            NodeKind::ListUnordered => "list-unordered",
            NodeKind::ListItem => "list-item",
            NodeKind::Link { .. } => "link",
            NodeKind::TextRun { .. } => "text",
        }
    }
}

/// A node stored in the tree arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Text of a run, or `None` for element nodes.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::TextRun { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Style of a run, or `None` for element nodes.
    pub fn style(&self) -> Option<&TextStyle> {
        match &self.kind {
            NodeKind::TextRun { style, .. } => Some(style),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_bounds() {
        assert!(HeadingLevel::new(0).is_err());
        assert!(HeadingLevel::new(7).is_err());
        assert_eq!(HeadingLevel::new(3).unwrap().tag(), "h3");
        assert!(NodeKind::heading(9).is_err());
    }

    #[test]
    fn test_child_rules() {
        assert!(NodeKind::ListUnordered.accepts_child(&NodeKind::ListItem));
        assert!(!NodeKind::ListUnordered.accepts_child(&NodeKind::Paragraph));
        assert!(!NodeKind::Root.accepts_child(&NodeKind::ListItem));
        assert!(NodeKind::ListItem.accepts_child(&NodeKind::ListOrdered));
        assert!(!NodeKind::Paragraph.accepts_child(&NodeKind::ListOrdered));
        assert!(!NodeKind::link("x").accepts_child(&NodeKind::link("y")));
    }

    #[test]
    fn test_empty_href_rejected() {
        assert!(NodeKind::link("  ").validate().is_err());
        assert!(NodeKind::link("https://example.com").validate().is_ok());
    }
}
