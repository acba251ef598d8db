//! Snapshot-based undo and redo.
//!
//! ## Learning: Snapshots over Inverse Edits
//!
//! A plain-text buffer can undo by applying an inverse edit. A rich-text
//! tree has too many edit shapes (splits, merges, re-parenting) for that to
//! stay manageable, so each undo step stores a snapshot of the state
//! *before* the mutation batch. Undo swaps the current state for that
//! snapshot; redo swaps it back.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// What produced a history entry. Only typing coalesces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Text typed or inserted at the caret.
    Typing,
    /// Any other committed mutation.
    Edit,
}

#[derive(Debug, Clone)]
struct Step<T> {
    before: T,
    kind: ChangeKind,
    /// `None` for redone steps, which never absorb typing.
    at: Option<Instant>,
}

/// Whether mutations are currently being folded into one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    Off,
    Open { recorded: bool },
}

/// Bounded undo/redo over snapshots of `T`.
///
/// Typing within the coalesce window folds into the previous typing step,
/// and everything between `begin_group` and `end_group` is a single step.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<Step<T>>,
    future: Vec<T>,
    limit: usize,
    coalesce: Duration,
    grouping: Grouping,
}

impl<T: Clone> History<T> {
    /// Keeps at most `limit` undo steps (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(limit.min(64)),
            future: Vec::new(),
            limit: limit.max(1),
            coalesce: Duration::from_millis(300),
            grouping: Grouping::Off,
        }
    }

    /// Overrides the typing coalesce window.
    pub fn with_coalesce_threshold(mut self, window: Duration) -> Self {
        self.coalesce = window;
        self
    }

    /// Records the state as it was before a committed mutation.
    ///
    /// Recording forgets anything that could be redone.
    pub fn record(&mut self, before: T, kind: ChangeKind) {
        self.future.clear();

        let grouping = self.grouping;
        match grouping {
            Grouping::Open { recorded: true } => return,
            Grouping::Open { recorded: false } => {
                self.grouping = Grouping::Open { recorded: true };
            }
            Grouping::Off if kind == ChangeKind::Typing && self.extend_typing() => return,
            Grouping::Off => {}
        }

        self.past.push_back(Step {
            before,
            kind,
            at: Some(Instant::now()),
        });
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Folds into the last step if it is recent typing.
    fn extend_typing(&mut self) -> bool {
        let window = self.coalesce;
        match self.past.back_mut() {
            Some(last)
                if last.kind == ChangeKind::Typing
                    && last.at.is_some_and(|t| t.elapsed() < window) =>
            {
                last.at = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    /// Starts a group; every mutation until `end_group()` is one undo step.
    pub fn begin_group(&mut self) {
        self.grouping = Grouping::Open { recorded: false };
    }

    pub fn end_group(&mut self) {
        self.grouping = Grouping::Off;
    }

    /// Steps back: takes the current state, returns the state to restore.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let step = self.past.pop_back()?;
        self.future.push(current);
        Some(step.before)
    }

    /// Steps forward again after an undo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(Step {
            before: current,
            kind: ChangeKind::Edit,
            at: None,
        });
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}
