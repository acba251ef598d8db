//! Block-level operations: block type changes and links.

use scribe_doc::{DocumentTree, NodeId, NodeKind, ResolvedRange, Selection};

use crate::format::isolate;
use crate::lists::{insert_list, remove_list};
use crate::toolbar::BlockType;
use crate::{CoreError, CoreResult};

/// Replaces the block wrapper of every top-level block the range touches.
///
/// Choosing the list type the blocks already have turns them back into
/// paragraphs.
pub fn set_block_type(tree: &mut DocumentTree, range: &ResolvedRange, target: BlockType) -> CoreResult<()> {
    let blocks = range.top_level_blocks(tree);
    if blocks.is_empty() {
        return Ok(());
    }
    let kind = target.node_kind();

    if target.is_list() {
        if blocks.iter().all(|b| tree.kind(*b) == Some(&kind)) {
            for list in blocks {
                remove_list(tree, list, NodeKind::Paragraph)?;
            }
        } else {
            insert_list(tree, &blocks, kind)?;
        }
        return Ok(());
    }

    for block in blocks {
        match tree.kind(block) {
            Some(k) if k.is_list() => {
                remove_list(tree, block, kind.clone())?;
            }
            Some(k) if *k != kind => tree.set_kind(block, kind.clone())?,
            _ => {}
        }
    }
    Ok(())
}

/// Wraps the selected runs in a link, or unwraps touched links.
pub fn toggle_link(
    tree: &mut DocumentTree,
    range: &ResolvedRange,
    href: Option<&str>,
) -> CoreResult<Option<Selection>> {
    match href {
        Some(href) => wrap_link(tree, range, href),
        None => {
            unwrap_links(tree, range)?;
            Ok(None)
        }
    }
}

fn wrap_link(tree: &mut DocumentTree, range: &ResolvedRange, href: &str) -> CoreResult<Option<Selection>> {
    let href = href.trim();
    if href.is_empty() {
        return Err(CoreError::Validation("link href must not be empty".to_string()));
    }
    let Some(isolated) = isolate(tree, range)? else {
        return Ok(None);
    };

    let (block, from, to) = {
        let view: &DocumentTree = tree;
        let first = outer(view, isolated.runs[0]);
        let Some(block) = view.parent(first) else {
            return Ok(None);
        };
        let indices: Vec<usize> = isolated
            .runs
            .iter()
            .map(|r| outer(view, *r))
            .filter(|o| view.parent(*o) == Some(block))
            .filter_map(|o| view.index_in_parent(o))
            .collect();
        let (Some(&from), Some(&to)) = (indices.iter().min(), indices.iter().max()) else {
            return Ok(None);
        };
        if indices.len() < isolated.runs.len() {
            tracing::debug!("link limited to the first block of the selection");
        }
        (block, from, to)
    };

    let covered = tree.children(block)[from..=to].to_vec();
    let link = tree.create_node(NodeKind::link(href))?;
    tree.insert_child(block, from, link)?;
    for child in covered {
        if matches!(tree.kind(child), Some(NodeKind::Link { .. })) {
            tree.move_children(child, link)?;
            tree.remove(child)?;
        } else {
            tree.detach(child)?;
            tree.append_child(link, child)?;
        }
    }
    Ok(Some(isolated.selection))
}

/// The inline child of a block holding `run`: the run itself, or the link
/// around it.
fn outer(tree: &DocumentTree, run: NodeId) -> NodeId {
    match tree.parent(run) {
        Some(p) if matches!(tree.kind(p), Some(NodeKind::Link { .. })) => p,
        _ => run,
    }
}

fn unwrap_links(tree: &mut DocumentTree, range: &ResolvedRange) -> CoreResult<()> {
    let mut touched = vec![range.start.node, range.end.node];
    touched.extend(range.run_slices(tree).into_iter().map(|s| s.run));

    let mut links = Vec::new();
    for node in touched {
        if let Some(link) = tree.closest(node, |k| matches!(k, NodeKind::Link { .. })) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }

    for link in links {
        let Some(parent) = tree.parent(link) else {
            continue;
        };
        let index = tree.index_in_parent(link).unwrap_or(0);
        let children = tree.children(link).to_vec();
        for child in &children {
            tree.detach(*child)?;
        }
        tree.remove(link)?;
        for (offset, child) in children.into_iter().enumerate() {
            tree.insert_child(parent, index + offset, child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_doc::Point;

    fn doc(blocks: &[&str]) -> (DocumentTree, Vec<NodeId>) {
        let mut tree = DocumentTree::new();
        let mut runs = Vec::new();
        for text in blocks {
            let p = tree.append(tree.root(), NodeKind::Paragraph).unwrap();
            runs.push(tree.append(p, NodeKind::text(*text)).unwrap());
        }
        (tree, runs)
    }

    fn range(tree: &DocumentTree, a: (NodeId, usize), b: (NodeId, usize)) -> ResolvedRange {
        Selection::new(Point::new(a.0, a.1), Point::new(b.0, b.1))
            .resolve(tree)
            .unwrap()
    }

    #[test]
    fn test_heading_preserves_inline_children() {
        let (mut tree, runs) = doc(&["one", "two"]);
        let r = range(&tree, (runs[0], 1), (runs[1], 1));
        set_block_type(&mut tree, &r, BlockType::parse("h2").unwrap()).unwrap();
        let blocks = tree.children(tree.root()).to_vec();
        assert!(blocks.iter().all(|b| tree.kind(*b) == Some(&NodeKind::heading(2).unwrap())));
        assert_eq!(tree.parent(runs[0]), Some(blocks[0]));
    }

    #[test]
    fn test_same_list_type_converts_back() {
        let (mut tree, runs) = doc(&["a", "b"]);
        let r = range(&tree, (runs[0], 0), (runs[1], 1));
        set_block_type(&mut tree, &r, BlockType::BulletList).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);

        let r = range(&tree, (runs[0], 0), (runs[1], 1));
        set_block_type(&mut tree, &r, BlockType::BulletList).unwrap();
        let blocks = tree.children(tree.root()).to_vec();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| tree.kind(*b) == Some(&NodeKind::Paragraph)));
    }

    #[test]
    fn test_list_to_quote() {
        let (mut tree, runs) = doc(&["a", "b"]);
        let r = range(&tree, (runs[0], 0), (runs[1], 1));
        set_block_type(&mut tree, &r, BlockType::NumberedList).unwrap();
        let r = range(&tree, (runs[0], 0), (runs[0], 1));
        set_block_type(&mut tree, &r, BlockType::Quote).unwrap();
        let blocks = tree.children(tree.root()).to_vec();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| tree.kind(*b) == Some(&NodeKind::Quote)));
    }

    #[test]
    fn test_wrap_and_unwrap_link() {
        let (mut tree, runs) = doc(&["click here now"]);
        let p = tree.parent(runs[0]).unwrap();
        let r = range(&tree, (runs[0], 6), (runs[0], 10));
        let sel = toggle_link(&mut tree, &r, Some("https://example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(tree.children(p).len(), 3);
        let link = tree.children(p)[1];
        assert_eq!(tree.text_content(link), "here");

        let r = sel.resolve(&tree).unwrap();
        toggle_link(&mut tree, &r, None).unwrap();
        assert!(tree.children(p).iter().all(|c| matches!(tree.kind(*c), Some(NodeKind::TextRun { .. }))));
        tree.normalize();
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text_content(p), "click here now");
    }

    #[test]
    fn test_empty_href_rejected() {
        let (mut tree, runs) = doc(&["x"]);
        let r = range(&tree, (runs[0], 0), (runs[0], 1));
        assert!(matches!(toggle_link(&mut tree, &r, Some("  ")), Err(CoreError::Validation(_))));
    }
}
