//! List insertion, removal and nesting.
//!
//! Conversions keep node identity: a paragraph becoming a list item is the
//! same node with a new kind, so selection points on it stay valid.

use scribe_doc::{DocResult, DocumentTree, NodeId, NodeKind};

/// Which way `indent` moves list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentDirection {
    Increase,
    Decrease,
}

/// Gathers consecutive top-level blocks into one list of `kind`.
///
/// Touched lists of the other kind change kind in place; neighbouring lists
/// of the same kind are merged in. Returns the list node.
pub fn insert_list(tree: &mut DocumentTree, blocks: &[NodeId], kind: NodeKind) -> DocResult<NodeId> {
    let root = tree.root();
    let Some(&first) = blocks.first() else {
        return Err(scribe_doc::DocError::InvalidStructure(
            "no blocks to convert".to_string(),
        ));
    };

    let previous = tree
        .previous_sibling(first)
        .filter(|p| tree.kind(*p) == Some(&kind));

    let (target, rest) = match previous {
        Some(list) => (list, blocks),
        None if tree.kind(first).is_some_and(NodeKind::is_list) => {
            tree.set_kind(first, kind.clone())?;
            (first, &blocks[1..])
        }
        None => {
            let index = tree.index_in_parent(first).unwrap_or(0);
            let list = tree.create_node(kind.clone())?;
            tree.insert_child(root, index, list)?;
            (list, blocks)
        }
    };

    for block in rest {
        if tree.kind(*block).is_some_and(NodeKind::is_list) {
            tree.move_children(*block, target)?;
            tree.remove(*block)?;
        } else {
            tree.detach(*block)?;
            tree.set_kind(*block, NodeKind::ListItem)?;
            tree.append_child(target, *block)?;
        }
    }

    if let Some(next) = tree
        .next_sibling(target)
        .filter(|n| tree.kind(*n) == Some(&kind))
    {
        tree.move_children(next, target)?;
        tree.remove(next)?;
    }

    tracing::debug!(list = %target, items = tree.children(target).len(), "inserted list");
    Ok(target)
}

/// Lifts every item of a top-level list (nested items included) into
/// top-level blocks of `kind`, in document order.
pub fn remove_list(tree: &mut DocumentTree, list: NodeId, kind: NodeKind) -> DocResult<Vec<NodeId>> {
    let root = tree.root();
    let index = tree.index_in_parent(list).unwrap_or(0);

    let mut lifted = Vec::new();
    for item in tree.children(list).to_vec() {
        lift_item(tree, item, &kind, &mut lifted)?;
    }
    tree.remove(list)?;

    for (offset, block) in lifted.iter().enumerate() {
        tree.insert_child(root, index + offset, *block)?;
    }
    Ok(lifted)
}

fn lift_item(
    tree: &mut DocumentTree,
    item: NodeId,
    kind: &NodeKind,
    out: &mut Vec<NodeId>,
) -> DocResult<()> {
    let nested: Vec<NodeId> = tree
        .children(item)
        .iter()
        .copied()
        .filter(|c| tree.kind(*c).is_some_and(NodeKind::is_list))
        .collect();
    for list in &nested {
        tree.detach(*list)?;
    }
    tree.detach(item)?;
    tree.set_kind(item, kind.clone())?;
    out.push(item);

    for list in nested {
        for child in tree.children(list).to_vec() {
            lift_item(tree, child, kind, out)?;
        }
        tree.remove(list)?;
    }
    Ok(())
}

/// Drops items whose ancestor item is also selected; they move along.
fn outermost(tree: &DocumentTree, items: &[NodeId]) -> Vec<NodeId> {
    items
        .iter()
        .copied()
        .filter(|item| !tree.ancestors(*item).any(|a| items.contains(&a)))
        .collect()
}

/// Moves list items one level deeper or shallower.
///
/// Returns true if anything moved.
pub fn indent(tree: &mut DocumentTree, items: &[NodeId], direction: IndentDirection) -> DocResult<bool> {
    let mut changed = false;
    for item in outermost(tree, items) {
        changed |= match direction {
            IndentDirection::Increase => increase(tree, item)?,
            IndentDirection::Decrease => decrease(tree, item)?,
        };
    }
    Ok(changed)
}

/// Moves an item into its previous sibling's nested list.
fn increase(tree: &mut DocumentTree, item: NodeId) -> DocResult<bool> {
    let Some(previous) = tree.previous_sibling(item) else {
        return Ok(false);
    };
    let Some(list_kind) = tree.parent(item).and_then(|l| tree.kind(l)).cloned() else {
        return Ok(false);
    };

    let nested = match tree
        .children(previous)
        .last()
        .copied()
        .filter(|c| tree.kind(*c).is_some_and(NodeKind::is_list))
    {
        Some(list) => list,
        None => tree.append(previous, list_kind)?,
    };
    tree.detach(item)?;
    tree.append_child(nested, item)?;
    Ok(true)
}

/// Lifts a nested item to sit after its parent item.
///
/// Siblings that followed it become its own nested list so document order
/// is preserved.
fn decrease(tree: &mut DocumentTree, item: NodeId) -> DocResult<bool> {
    let Some(list) = tree.parent(item) else {
        return Ok(false);
    };
    let Some(parent_item) = tree
        .parent(list)
        .filter(|p| tree.kind(*p) == Some(&NodeKind::ListItem))
    else {
        return Ok(false);
    };
    let Some(outer_list) = tree.parent(parent_item) else {
        return Ok(false);
    };
    let list_kind = tree.kind(list).cloned().unwrap_or(NodeKind::ListUnordered);

    let index = tree.index_in_parent(item).unwrap_or(0);
    let following: Vec<NodeId> = tree.children(list)[index + 1..].to_vec();

    tree.detach(item)?;
    let at = tree.index_in_parent(parent_item).unwrap_or(0) + 1;
    tree.insert_child(outer_list, at, item)?;

    if !following.is_empty() {
        let target = match tree
            .children(item)
            .last()
            .copied()
            .filter(|c| tree.kind(*c) == Some(&list_kind))
        {
            Some(existing) => existing,
            None => tree.append(item, list_kind)?,
        };
        for sibling in following {
            tree.detach(sibling)?;
            tree.append_child(target, sibling)?;
        }
    }

    if tree.children(list).is_empty() {
        tree.remove(list)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(texts: &[&str]) -> (DocumentTree, Vec<NodeId>) {
        let mut tree = DocumentTree::new();
        let mut ids = Vec::new();
        for text in texts {
            let p = tree.append(tree.root(), NodeKind::Paragraph).unwrap();
            tree.append(p, NodeKind::text(*text)).unwrap();
            ids.push(p);
        }
        (tree, ids)
    }

    fn flat_list(texts: &[&str]) -> (DocumentTree, NodeId, Vec<NodeId>) {
        let (mut tree, ids) = paragraphs(texts);
        let list = insert_list(&mut tree, &ids, NodeKind::ListUnordered).unwrap();
        (tree, list, ids)
    }

    #[test]
    fn test_insert_list_keeps_ids() {
        let (tree, list, ids) = flat_list(&["a", "b"]);
        assert_eq!(tree.children(tree.root()), &[list]);
        assert_eq!(tree.children(list), ids.as_slice());
        assert_eq!(tree.kind(ids[0]), Some(&NodeKind::ListItem));
    }

    #[test]
    fn test_insert_list_merges_neighbours() {
        let (mut tree, ids) = paragraphs(&["a", "b", "c"]);
        insert_list(&mut tree, &ids[..1], NodeKind::ListOrdered).unwrap();
        insert_list(&mut tree, &ids[2..], NodeKind::ListOrdered).unwrap();
        let list = insert_list(&mut tree, &ids[1..2], NodeKind::ListOrdered).unwrap();
        assert_eq!(tree.children(tree.root()), &[list]);
        assert_eq!(tree.text_content(list), "abc");
    }

    #[test]
    fn test_remove_list_lifts_nested_items() {
        let (mut tree, list, ids) = flat_list(&["a", "b", "c"]);
        indent(&mut tree, &[ids[1]], IndentDirection::Increase).unwrap();
        let lifted = remove_list(&mut tree, list, NodeKind::Paragraph).unwrap();
        assert_eq!(lifted, ids);
        assert_eq!(tree.children(tree.root()), ids.as_slice());
        assert!(ids.iter().all(|p| tree.kind(*p) == Some(&NodeKind::Paragraph)));
    }

    #[test]
    fn test_increase_without_previous_is_noop() {
        let (mut tree, _, ids) = flat_list(&["a", "b"]);
        let before = tree.outline();
        assert!(!indent(&mut tree, &[ids[0]], IndentDirection::Increase).unwrap());
        assert_eq!(tree.outline(), before);
    }

    #[test]
    fn test_increase_then_decrease_restores() {
        let (mut tree, _, ids) = flat_list(&["a", "b", "c"]);
        let before = tree.outline();
        assert!(indent(&mut tree, &[ids[1]], IndentDirection::Increase).unwrap());
        assert_eq!(tree.parent(tree.parent(ids[1]).unwrap()), Some(ids[0]));
        assert!(indent(&mut tree, &[ids[1]], IndentDirection::Decrease).unwrap());
        assert_eq!(tree.outline(), before);
    }

    #[test]
    fn test_decrease_carries_following_siblings() {
        let (mut tree, list, ids) = flat_list(&["a", "b", "c", "d"]);
        indent(&mut tree, &ids[1..], IndentDirection::Increase).unwrap();
        // a > [b, c, d]
        indent(&mut tree, &[ids[2]], IndentDirection::Decrease).unwrap();
        // a > [b], c > [d]
        assert_eq!(tree.children(list), &[ids[0], ids[2]]);
        assert_eq!(tree.text_content(ids[2]), "cd");
        assert_eq!(tree.text_content(ids[0]), "ab");
    }

    #[test]
    fn test_decrease_at_top_level_is_noop() {
        let (mut tree, _, ids) = flat_list(&["a"]);
        assert!(!indent(&mut tree, &[ids[0]], IndentDirection::Decrease).unwrap());
    }
}
