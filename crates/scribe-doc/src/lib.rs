//! # Scribe Doc
//!
//! Rich-text document model: a tree of typed content nodes with stable
//! per-node identity, inline styles, selections and snapshot history.
//!
//! ## Key Concepts
//!
//! ### Ownership & Borrowing
//! - `DocumentTree` owns every node in an arena keyed by `NodeId`
//! - Lookups return borrowed references (`&Node`, `&[NodeId]`)
//! - Mutations require `&mut self` (exclusive access)
//!
//! ### Invariants
//! - `ListItem` nodes live only directly under list nodes
//! - Heading levels are always within `1..=6`
//! - After `normalize()`, no two neighbouring runs share a style

mod history;
mod node;
mod selection;
mod style;
mod tree;

pub use history::{ChangeKind, History};
pub use node::{HeadingLevel, Node, NodeId, NodeKind};
pub use selection::{Point, ResolvedRange, RunSlice, Selection};
pub use style::{Change, FormatFlag, FormatFlags, StylePatch, StyleProperty, TextStyle};
pub use tree::{DocumentTree, OutlineNode, RunRemap};

/// Result type for document operations
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur during document operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Offset {offset} is out of bounds for {node} (length {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },
}
