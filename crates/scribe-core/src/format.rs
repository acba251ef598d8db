//! Inline formatting over a selection.
//!
//! Every operation first *isolates* the range: runs only partly inside it
//! are split so that the selected characters form whole runs. Styles are
//! then patched run by run, and the session's normalization pass merges
//! whatever became equal again.

use scribe_doc::{
    DocResult, DocumentTree, FormatFlag, NodeId, NodeKind, Point, ResolvedRange, Selection,
    StylePatch,
};

use crate::toolbar::caret_run;
use crate::{CoreError, CoreResult};

/// The runs covering a range after isolation, plus a selection over them.
#[derive(Debug, Clone)]
pub struct Isolated {
    pub runs: Vec<NodeId>,
    pub selection: Selection,
}

/// Splits partial runs at the range boundaries.
///
/// Returns `None` when the range covers no characters.
pub fn isolate(tree: &mut DocumentTree, range: &ResolvedRange) -> DocResult<Option<Isolated>> {
    let slices = range.run_slices(tree);
    if slices.is_empty() {
        return Ok(None);
    }

    let mut runs = Vec::with_capacity(slices.len());
    for slice in slices {
        if slice.end < slice.len {
            tree.split_run(slice.run, slice.end)?;
        }
        let selected = if slice.start > 0 {
            tree.split_run(slice.run, slice.start)?
        } else {
            slice.run
        };
        runs.push(selected);
    }

    let (Some(first), Some(last)) = (runs.first().copied(), runs.last().copied()) else {
        return Ok(None);
    };
    let start = Point::new(first, 0);
    let end = Point::new(last, tree.text_len(last));
    let selection = if range.backward {
        Selection::new(end, start)
    } else {
        Selection::new(start, end)
    };
    Ok(Some(Isolated { runs, selection }))
}

/// Flips a flag across the range; mixed ranges turn it on everywhere.
pub fn toggle_inline_format(
    tree: &mut DocumentTree,
    range: &ResolvedRange,
    flag: FormatFlag,
) -> CoreResult<Option<Selection>> {
    let Some(isolated) = isolate(tree, range)? else {
        return Ok(None);
    };
    let all_on = isolated.runs.iter().all(|run| {
        tree.get(*run)
            .and_then(|n| n.style())
            .is_some_and(|s| s.flags.get(flag))
    });
    let patch = StylePatch::flag(flag, !all_on);
    for run in &isolated.runs {
        tree.set_style(*run, &patch);
    }
    Ok(Some(isolated.selection))
}

/// Applies a style patch to every run in the range.
pub fn apply_patch(
    tree: &mut DocumentTree,
    range: &ResolvedRange,
    patch: &StylePatch,
) -> CoreResult<Option<Selection>> {
    let Some(isolated) = isolate(tree, range)? else {
        return Ok(None);
    };
    for run in &isolated.runs {
        tree.set_style(*run, patch);
    }
    Ok(Some(isolated.selection))
}

/// Resets the style of every run in the range.
pub fn clear_formatting(
    tree: &mut DocumentTree,
    range: &ResolvedRange,
) -> CoreResult<Option<Selection>> {
    let Some(isolated) = isolate(tree, range)? else {
        return Ok(None);
    };
    tree.clear_formatting(&isolated.runs);
    Ok(Some(isolated.selection))
}

/// Inserts text at the end of the range, styled by the pending caret style.
///
/// Returns the caret after the inserted text.
pub fn insert_text(
    tree: &mut DocumentTree,
    range: &ResolvedRange,
    text: &str,
    pending: &StylePatch,
) -> CoreResult<Option<Selection>> {
    if text.is_empty() {
        return Ok(None);
    }
    let (run, offset) = caret_target(tree, range.end)?;
    let inserted = text.chars().count();

    let current = tree
        .get(run)
        .and_then(|n| n.style())
        .cloned()
        .unwrap_or_default();
    let mut styled = current.clone();
    styled.apply(pending);

    if styled == current {
        tree.insert_text(run, offset, text)?;
        return Ok(Some(Selection::caret(Point::new(run, offset + inserted))));
    }

    let parent = tree
        .parent(run)
        .ok_or_else(|| CoreError::Validation(format!("{run} is detached")))?;
    let index = tree.index_in_parent(run).unwrap_or(0);
    let len = tree.text_len(run);
    let at = if offset == 0 {
        index
    } else {
        if offset < len {
            tree.split_run(run, offset)?;
        }
        index + 1
    };
    let new_run = tree.create_node(NodeKind::styled_text(text, styled))?;
    tree.insert_child(parent, at, new_run)?;
    Ok(Some(Selection::caret(Point::new(new_run, inserted))))
}

/// Resolves a point to a text run and character offset to type at,
/// creating an empty run (and block) where there is none.
fn caret_target(tree: &mut DocumentTree, point: Point) -> CoreResult<(NodeId, usize)> {
    let kind = tree
        .kind(point.node)
        .cloned()
        .ok_or(scribe_doc::DocError::NodeNotFound(point.node))?;

    if let NodeKind::TextRun { .. } = kind {
        let len = tree.text_len(point.node);
        return Ok((point.node, point.offset.min(len)));
    }

    if let Some(run) = caret_run(tree, point.node, point.offset) {
        let offset = if point.offset == 0 { 0 } else { tree.text_len(run) };
        return Ok((run, offset));
    }

    // No text anywhere under the element: make somewhere to type.
    let container = match kind {
        NodeKind::Root => tree.append(point.node, NodeKind::Paragraph)?,
        NodeKind::ListOrdered | NodeKind::ListUnordered => {
            tree.append(point.node, NodeKind::ListItem)?
        }
        _ => point.node,
    };
    let run = tree.append(container, NodeKind::text(""))?;
    Ok((run, 0))
}
