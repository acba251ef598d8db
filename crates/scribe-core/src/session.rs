//! The editor session.
//!
//! ## Learning: One Owner, Explicit Handles
//!
//! A `Session` exclusively owns its document tree, selection and history.
//! Hosts hold the session itself (or `&mut` to it) and call operations on
//! it directly; there is no global editor instance to reach for. Every
//! committed mutation goes through one path (`commit`) which records
//! history, normalizes, remaps the selection, serializes and notifies.

use tokio::sync::broadcast;

use scribe_doc::{
    Change, ChangeKind, DocumentTree, FormatFlag, History, Point, ResolvedRange, Selection,
    StylePatch, StyleProperty,
};
use scribe_html::ImportReport;

use crate::command::DispatchPhase;
use crate::config::EditorConfig;
use crate::event::{EventBus, SessionEvent};
use crate::lists::IndentDirection;
use crate::toolbar::{BlockType, FontOptions, ToolbarState};
use crate::{CoreError, CoreResult, blocks, format, lists};

/// What an undo step restores.
#[derive(Debug, Clone)]
struct Snapshot {
    tree: DocumentTree,
    selection: Option<Selection>,
}

/// An editing session over one document.
pub struct Session {
    tree: DocumentTree,
    selection: Option<Selection>,
    /// Format toggles made on a collapsed caret, applied to the next insert.
    pending: StylePatch,
    history: History<Snapshot>,
    events: EventBus,
    toolbar: ToolbarState,
    fonts: FontOptions,
    html: String,
    phase: DispatchPhase,
}

impl Session {
    /// Creates a session over an empty document.
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    /// Creates a session with editor settings from configuration.
    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            tree: DocumentTree::new(),
            selection: None,
            pending: StylePatch::default(),
            history: History::new(config.undo_limit)
                .with_coalesce_threshold(config.coalesce_window()),
            events: EventBus::new(),
            toolbar: ToolbarState::default(),
            fonts: FontOptions::from_config(config),
            html: String::new(),
            phase: DispatchPhase::Idle,
        }
    }

    /// Creates a session pre-loaded with HTML. The load is not undoable.
    pub fn from_html(html: &str) -> Self {
        let mut session = Self::new();
        scribe_html::deserialize_into(&mut session.tree, html);
        session.html = scribe_html::serialize(&session.tree);
        session
    }

    // ==================== Accessors ====================

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// HTML of the current document, as last emitted.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn toolbar_state(&self) -> &ToolbarState {
        &self.toolbar
    }

    pub fn pending_style(&self) -> &StylePatch {
        &self.pending
    }

    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Subscribes to content and toolbar notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ==================== Selection ====================

    /// Replaces the selection.
    ///
    /// Points must address nodes in this document. Moving the selection
    /// drops any pending caret style.
    pub fn set_selection(&mut self, selection: Option<Selection>) -> CoreResult<()> {
        if let Some(sel) = &selection {
            if !sel.is_valid(&self.tree) {
                return Err(CoreError::Validation(
                    "selection points at nodes outside the document".to_string(),
                ));
            }
        }
        if selection != self.selection {
            self.pending = StylePatch::default();
        }
        self.selection = selection;
        self.refresh_toolbar();
        Ok(())
    }

    /// Selects the whole document.
    pub fn select_all(&mut self) {
        let blocks = self.tree.children(self.tree.root());
        let selection = match (blocks.first(), blocks.last()) {
            (Some(first), Some(last)) => Selection::new(Point::new(*first, 0), Point::new(*last, 1)),
            _ => Selection::caret(Point::new(self.tree.root(), 0)),
        };
        // Both points are attached by construction.
        let _ = self.set_selection(Some(selection));
    }

    /// Places a caret at the end of the document.
    pub fn select_end(&mut self) {
        let point = match self.tree.text_runs().last() {
            Some(run) => Point::new(*run, self.tree.text_len(*run)),
            None => Point::new(self.tree.root(), 1),
        };
        let _ = self.set_selection(Some(Selection::caret(point)));
    }

    // ==================== Toolbar Operations ====================

    /// Flips an inline format across the selection.
    ///
    /// On a collapsed caret the toggle is held as pending caret style.
    pub fn toggle_inline_format(&mut self, flag: FormatFlag) -> CoreResult<bool> {
        let Some(range) = self.range() else {
            return Ok(false);
        };
        if range.is_collapsed() {
            let on = !self.toolbar.flags.get(flag);
            self.pending.merge(StylePatch::flag(flag, on));
            self.refresh_toolbar();
            return Ok(false);
        }
        self.edit(ChangeKind::Edit, |tree, range| {
            format::toggle_inline_format(tree, range, flag)
        })
    }

    /// Changes the block type of every touched top-level block.
    pub fn set_block_type(&mut self, block: BlockType) -> CoreResult<bool> {
        self.edit(ChangeKind::Edit, |tree, range| {
            blocks::set_block_type(tree, range, block)?;
            Ok(None)
        })
    }

    /// Sets or clears one style property across the selection.
    ///
    /// Font sizes accept `"15px"` or `"15"`; an empty value clears. Families
    /// and sizes must be among the configured choices, and no value may
    /// carry more than one CSS declaration.
    pub fn set_text_style_property(
        &mut self,
        property: StyleProperty,
        value: Option<&str>,
    ) -> CoreResult<bool> {
        let patch = property_patch(&self.fonts, property, value)?;
        let Some(range) = self.range() else {
            return Ok(false);
        };
        if range.is_collapsed() {
            self.pending.merge(patch);
            self.refresh_toolbar();
            return Ok(false);
        }
        self.edit(ChangeKind::Edit, |tree, range| {
            format::apply_patch(tree, range, &patch)
        })
    }

    /// Nests or un-nests the selected list items.
    pub fn indent(&mut self, direction: IndentDirection) -> CoreResult<bool> {
        self.edit(ChangeKind::Edit, |tree, range| {
            let items = range.list_items(tree);
            lists::indent(tree, &items, direction)?;
            Ok(None)
        })
    }

    /// Inserts an emoji at the caret.
    pub fn insert_emoji(&mut self, emoji: &str) -> CoreResult<bool> {
        self.insert(emoji, ChangeKind::Edit)
    }

    /// Inserts typed text at the caret; rapid typing coalesces in history.
    pub fn insert_text(&mut self, text: &str) -> CoreResult<bool> {
        self.insert(text, ChangeKind::Typing)
    }

    fn insert(&mut self, text: &str, kind: ChangeKind) -> CoreResult<bool> {
        let pending = self.pending.clone();
        let changed = self.edit(kind, |tree, range| {
            format::insert_text(tree, range, text, &pending)
        })?;
        if changed {
            self.pending = StylePatch::default();
            self.refresh_toolbar();
        }
        Ok(changed)
    }

    /// Resets text formatting on the selection.
    pub fn clear_formatting(&mut self) -> CoreResult<bool> {
        let Some(range) = self.range() else {
            return Ok(false);
        };
        if range.is_collapsed() && !self.pending.is_empty() {
            self.pending = StylePatch::default();
            self.refresh_toolbar();
            return Ok(false);
        }
        self.edit(ChangeKind::Edit, format::clear_formatting)
    }

    /// Wraps the selection in a link, or removes touched links.
    pub fn toggle_link(&mut self, href: Option<&str>) -> CoreResult<bool> {
        self.edit(ChangeKind::Edit, |tree, range| {
            blocks::toggle_link(tree, range, href)
        })
    }

    // ==================== History ====================

    pub fn undo(&mut self) -> CoreResult<bool> {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                Ok(true)
            }
            None => {
                tracing::debug!("nothing to undo");
                Ok(false)
            }
        }
    }

    pub fn redo(&mut self) -> CoreResult<bool> {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                Ok(true)
            }
            None => {
                tracing::debug!("nothing to redo");
                Ok(false)
            }
        }
    }

    pub(crate) fn begin_group(&mut self) {
        self.history.begin_group();
    }

    pub(crate) fn end_group(&mut self) {
        self.history.end_group();
    }

    // ==================== HTML ====================

    /// Replaces the document with parsed HTML, in place.
    ///
    /// The session keeps its identity, subscribers and history; the load
    /// itself is one undoable step.
    pub fn load_html(&mut self, html: &str) -> ImportReport {
        let before = self.snapshot();
        let report = scribe_html::deserialize_into(&mut self.tree, html);
        if self.selection.is_some_and(|s| !s.is_valid(&self.tree)) {
            self.selection = None;
        }
        self.commit(before, ChangeKind::Edit);
        report
    }

    // ==================== Commit Path ====================

    fn range(&self) -> Option<ResolvedRange> {
        let range = self.selection.as_ref()?.resolve(&self.tree);
        if range.is_none() {
            tracing::debug!("selection no longer resolves");
        }
        range
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.tree.clone(),
            selection: self.selection,
        }
    }

    pub(crate) fn enter_phase(&mut self, phase: DispatchPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "dispatch phase");
        self.phase = phase;
    }

    /// Runs a mutation over the resolved selection and commits it.
    ///
    /// The edit may return a new selection; `None` keeps the current one.
    /// On error the document is left exactly as it was.
    fn edit<F>(&mut self, kind: ChangeKind, op: F) -> CoreResult<bool>
    where
        F: FnOnce(&mut DocumentTree, &ResolvedRange) -> CoreResult<Option<Selection>>,
    {
        let Some(range) = self.range() else {
            tracing::debug!("no selection; action ignored");
            return Ok(false);
        };
        let before = self.snapshot();

        match op(&mut self.tree, &range) {
            Ok(Some(selection)) => self.selection = Some(selection),
            Ok(None) => {}
            Err(e) => {
                self.tree = before.tree;
                self.selection = before.selection;
                return Err(e);
            }
        }
        Ok(self.commit(before, kind))
    }

    /// Finishes a mutation: normalize, record, serialize, notify.
    ///
    /// Returns false (and records nothing) if the document is unchanged.
    fn commit(&mut self, before: Snapshot, kind: ChangeKind) -> bool {
        if self.phase != DispatchPhase::Idle {
            self.enter_phase(DispatchPhase::TreeMutated);
        }

        let remaps = self.tree.normalize();
        if let Some(selection) = self.selection.as_mut() {
            selection.remap(&remaps);
        }
        if self.selection.is_some_and(|s| !s.is_valid(&self.tree)) {
            self.selection = None;
        }

        if self.tree.outline() == before.tree.outline() {
            self.selection = self.selection.or(before.selection);
            self.refresh_toolbar();
            return false;
        }

        self.history.record(before, kind);
        self.publish_content();
        true
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.tree = snapshot.tree;
        self.selection = snapshot.selection.filter(|s| s.is_valid(&self.tree));
        self.pending = StylePatch::default();
        self.publish_content();
    }

    fn publish_content(&mut self) {
        self.html = scribe_html::serialize(&self.tree);
        self.events.emit(SessionEvent::ContentChanged(self.html.clone()));
        self.refresh_toolbar();
    }

    fn refresh_toolbar(&mut self) {
        let state = ToolbarState::derive(
            &self.tree,
            self.selection.as_ref(),
            &self.pending,
            &self.fonts,
            self.history.can_undo(),
            self.history.can_redo(),
        );
        if self.phase != DispatchPhase::Idle {
            self.enter_phase(DispatchPhase::UIStateRecomputed);
        }
        if state != self.toolbar {
            self.toolbar = state.clone();
            self.events.emit(SessionEvent::ToolbarChanged(state));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the patch for one property value.
fn property_patch(
    fonts: &FontOptions,
    property: StyleProperty,
    value: Option<&str>,
) -> CoreResult<StylePatch> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let mut patch = StylePatch::default();

    match property {
        StyleProperty::FontSize => {
            patch.font_size_px = match value {
                None => Change::Clear,
                Some(v) => Change::Set(fonts.size(v)?),
            };
        }
        StyleProperty::FontFamily => {
            patch.font_family = match value {
                None => Change::Clear,
                Some(v) => Change::Set(fonts.family(v)?),
            };
        }
        StyleProperty::Color => patch.color = color_change(value)?,
        StyleProperty::BackgroundColor => patch.background_color = color_change(value)?,
    }
    Ok(patch)
}

/// Colors are free-form CSS, but must stay a single declaration value.
fn color_change(value: Option<&str>) -> CoreResult<Change<String>> {
    match value {
        None => Ok(Change::Clear),
        Some(v) if scribe_html::is_plain_value(v) => Ok(Change::Set(v.to_string())),
        Some(v) => Err(CoreError::Validation(format!("invalid color '{v}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ToolbarAction;
    use proptest::prelude::*;
    use scribe_doc::NodeKind;

    fn block_kinds(tree: &DocumentTree) -> Vec<NodeKind> {
        tree.children(tree.root())
            .iter()
            .filter_map(|b| tree.kind(*b).cloned())
            .collect()
    }

    fn session(html: &str) -> Session {
        let mut session = Session::from_html(html);
        session.select_all();
        session
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn test_bold_on_mixed_runs_makes_all_bold() {
        let mut s = session("<p>plain <strong>bold</strong> plain</p>");
        assert!(s.toggle_inline_format(FormatFlag::Bold).unwrap());
        assert_eq!(s.html(), "<p><strong>plain bold plain</strong></p>");
        assert!(s.toolbar_state().flags.bold);

        assert!(s.toggle_inline_format(FormatFlag::Bold).unwrap());
        assert_eq!(s.html(), "<p>plain bold plain</p>");
    }

    #[test]
    fn test_no_selection_is_silent_noop() {
        let mut s = Session::from_html("<p>x</p>");
        let mut rx = s.subscribe();
        assert!(!s.toggle_inline_format(FormatFlag::Bold).unwrap());
        assert!(!s.set_block_type(BlockType::Quote).unwrap());
        assert!(!s.insert_text("y").unwrap());
        assert!(drain(&mut rx).is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_indent_on_paragraph_changes_nothing() {
        let mut s = session("<p>one</p><p>two</p>");
        let before = s.tree().outline();
        let mut rx = s.subscribe();
        assert!(!s.indent(IndentDirection::Increase).unwrap());
        assert_eq!(s.tree().outline(), before);
        assert!(!s.can_undo());
        assert!(drain(&mut rx)
            .iter()
            .all(|e| !matches!(e, SessionEvent::ContentChanged(_))));
    }

    #[test]
    fn test_partial_selection_splits_runs() {
        let mut s = Session::from_html("<p>hello world</p>");
        let run = s.tree().text_runs()[0];
        s.set_selection(Some(Selection::new(Point::new(run, 6), Point::new(run, 11))))
            .unwrap();
        s.toggle_inline_format(FormatFlag::Italic).unwrap();
        assert_eq!(s.html(), "<p>hello <em>world</em></p>");
        assert!(s.toolbar_state().flags.italic);
    }

    #[test]
    fn test_undo_redo_restores_content() {
        let mut s = session("<p>text</p>");
        s.set_block_type(BlockType::parse("h1").unwrap()).unwrap();
        assert_eq!(s.html(), "<h1>text</h1>");
        assert!(s.toolbar_state().can_undo);

        assert!(s.undo().unwrap());
        assert_eq!(s.html(), "<p>text</p>");
        assert!(s.can_redo());
        assert!(!s.undo().unwrap());

        assert!(s.redo().unwrap());
        assert_eq!(s.html(), "<h1>text</h1>");
        assert!(!s.redo().unwrap());
    }

    #[test]
    fn test_content_changed_event_carries_html() {
        let mut s = session("<p>a</p>");
        let mut rx = s.subscribe();
        s.set_block_type(BlockType::Quote).unwrap();
        let events = drain(&mut rx);
        assert!(events.contains(&SessionEvent::ContentChanged("<blockquote>a</blockquote>".to_string())));
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::ToolbarChanged(state) if state.block_type == Some(BlockType::Quote)
        )));
    }

    #[test]
    fn test_pending_caret_style_applies_to_next_insert() {
        let mut s = Session::from_html("<p>ab</p>");
        let run = s.tree().text_runs()[0];
        s.set_selection(Some(Selection::caret(Point::new(run, 1)))).unwrap();

        assert!(!s.toggle_inline_format(FormatFlag::Bold).unwrap());
        assert!(s.toolbar_state().flags.bold);
        assert_eq!(s.html(), "<p>ab</p>");

        s.insert_text("X").unwrap();
        assert_eq!(s.html(), "<p>a<strong>X</strong>b</p>");
        assert!(s.pending_style().is_empty());

        s.insert_text("Y").unwrap();
        assert_eq!(s.html(), "<p>a<strong>XY</strong>b</p>");
    }

    #[test]
    fn test_insert_emoji_collapses_range_to_end() {
        let mut s = session("<p>hi</p>");
        s.insert_emoji("🎉").unwrap();
        assert_eq!(s.html(), "<p>hi🎉</p>");
        let sel = s.selection().unwrap();
        assert!(sel.is_collapsed());
    }

    #[test]
    fn test_typing_coalesces_into_one_undo_step() {
        let mut s = session("<p>a</p>");
        s.select_end();
        s.insert_text("b").unwrap();
        s.insert_text("c").unwrap();
        assert_eq!(s.html(), "<p>abc</p>");
        s.undo().unwrap();
        assert_eq!(s.html(), "<p>a</p>");
    }

    #[test]
    fn test_font_size_validation() {
        let mut s = session("<p>a</p>");
        assert!(matches!(
            s.set_text_style_property(StyleProperty::FontSize, Some("large")),
            Err(CoreError::Validation(_))
        ));
        assert!(s.set_text_style_property(StyleProperty::FontSize, Some("15")).unwrap());
        assert_eq!(s.html(), "<p><span style=\"font-size: 15px\">a</span></p>");
        assert_eq!(s.toolbar_state().font_size_px, Some(15));

        assert!(s.set_text_style_property(StyleProperty::FontSize, Some("")).unwrap());
        assert_eq!(s.html(), "<p>a</p>");
        assert_eq!(s.toolbar_state().font_size_px, Some(15));

        assert!(s.set_text_style_property(StyleProperty::FontSize, Some("13px")).is_err());
    }

    #[test]
    fn test_style_values_cannot_smuggle_declarations() {
        let mut s = session("<p>hello</p>");
        let mut rx = s.subscribe();
        for (property, value) in [
            (StyleProperty::Color, "red; font-weight: bold"),
            (StyleProperty::BackgroundColor, "#fff}"),
            (StyleProperty::FontFamily, "Arial; font-style: italic"),
        ] {
            assert!(matches!(
                s.set_text_style_property(property, Some(value)),
                Err(CoreError::Validation(_))
            ));
        }
        assert_eq!(s.html(), "<p>hello</p>");
        assert!(!s.can_undo());
        assert!(drain(&mut rx).is_empty());

        assert!(s.set_text_style_property(StyleProperty::Color, Some("rgb(1, 2, 3)")).unwrap());
        assert!(s.set_text_style_property(StyleProperty::FontFamily, Some("times new roman")).unwrap());
        assert_eq!(
            s.html(),
            "<p><span style=\"font-family: Times New Roman; color: rgb(1, 2, 3)\">hello</span></p>"
        );
        let back = scribe_html::deserialize(s.html());
        assert_eq!(back.outline(), s.tree().outline());
    }

    #[test]
    fn test_clear_formatting_keeps_block() {
        let mut s = session("<h2><strong><em>t</em></strong></h2>");
        s.clear_formatting().unwrap();
        assert_eq!(s.html(), "<h2>t</h2>");
    }

    #[test]
    fn test_list_conversion_and_indent() {
        let mut s = session("<p>a</p><p>b</p>");
        s.set_block_type(BlockType::BulletList).unwrap();
        assert_eq!(s.html(), "<ul><li>a</li><li>b</li></ul>");

        let b = s.tree().text_runs()[1];
        s.set_selection(Some(Selection::caret(Point::new(b, 0)))).unwrap();
        s.indent(IndentDirection::Increase).unwrap();
        assert_eq!(s.html(), "<ul><li>a<ul><li>b</li></ul></li></ul>");
        s.indent(IndentDirection::Decrease).unwrap();
        assert_eq!(s.html(), "<ul><li>a</li><li>b</li></ul>");

        s.select_all();
        s.set_block_type(BlockType::BulletList).unwrap();
        assert_eq!(
            block_kinds(s.tree()),
            vec![NodeKind::Paragraph, NodeKind::Paragraph]
        );
    }

    #[test]
    fn test_link_toggle() {
        let mut s = session("<p>site</p>");
        assert!(matches!(s.toggle_link(Some("")), Err(CoreError::Validation(_))));
        assert_eq!(s.html(), "<p>site</p>");
        s.toggle_link(Some("https://example.com")).unwrap();
        assert_eq!(s.html(), "<p><a href=\"https://example.com\">site</a></p>");
        s.toggle_link(None).unwrap();
        assert_eq!(s.html(), "<p>site</p>");
    }

    #[test]
    fn test_load_html_is_undoable_and_keeps_subscribers() {
        let mut s = session("<p>draft</p>");
        let mut rx = s.subscribe();
        let report = s.load_html("<h1>Stored</h1><p>post</p>");
        assert_eq!(report.blocks, 2);
        assert!(drain(&mut rx).contains(&SessionEvent::ContentChanged(
            "<h1>Stored</h1><p>post</p>".to_string()
        )));
        s.undo().unwrap();
        assert_eq!(s.html(), "<p>draft</p>");
    }

    #[test]
    fn test_dispatch_returns_to_idle() {
        let mut s = session("<p>x</p>");
        assert!(s.dispatch(&ToolbarAction::ToggleFormat(FormatFlag::Underline)).unwrap());
        assert_eq!(s.phase(), DispatchPhase::Idle);
        assert!(s.tree().text_runs().iter().all(|r| {
            s.tree().get(*r).and_then(|n| n.style()).is_some_and(|st| st.flags.underline)
        }));
    }

    #[test]
    fn test_dispatch_group_is_one_step() {
        let mut s = session("<p>x</p>");
        s.dispatch_group(&[
            ToolbarAction::ToggleFormat(FormatFlag::Bold),
            ToolbarAction::SetBlockType(BlockType::Quote),
        ])
        .unwrap();
        assert_eq!(s.html(), "<blockquote><strong>x</strong></blockquote>");
        s.undo().unwrap();
        assert_eq!(s.html(), "<p>x</p>");
    }

    #[test]
    fn test_invalid_selection_rejected() {
        let mut s = Session::from_html("<p>x</p>");
        let other = Session::from_html("<p>a</p><p>b</p><p>c</p>");
        let foreign = other.tree().text_runs()[2];
        assert!(s.set_selection(Some(Selection::caret(Point::new(foreign, 0)))).is_err());
        assert!(s.selection().is_none());
    }

    fn action_strategy() -> impl Strategy<Value = ToolbarAction> {
        prop_oneof![
            prop::sample::select(FormatFlag::ALL.to_vec()).prop_map(ToolbarAction::ToggleFormat),
            prop::sample::select(vec!["p", "h1", "h3", "blockquote", "code", "ul", "ol"])
                .prop_map(|b| ToolbarAction::SetBlockType(BlockType::parse(b).unwrap())),
            (
                prop::sample::select(vec![
                    StyleProperty::FontFamily,
                    StyleProperty::FontSize,
                    StyleProperty::Color,
                    StyleProperty::BackgroundColor,
                ]),
                prop::option::of(0usize..4),
            )
                .prop_map(|(property, pick)| {
                    let choices: &[&str] = match property {
                        StyleProperty::FontFamily => {
                            &["Georgia", "times new roman", "Comic Sans", "Arial;x:y"]
                        }
                        StyleProperty::FontSize => &["12px", "96", "13px", "1em"],
                        _ => &["#abc", "rgb(1, 2, 3)", "hsl(120 50% 50%)", "red; font-weight: bold"],
                    };
                    let value = pick.map(|i| choices[i].to_string());
                    ToolbarAction::SetStyleProperty { property, value }
                }),
            prop::sample::select(vec![IndentDirection::Increase, IndentDirection::Decrease])
                .prop_map(ToolbarAction::Indent),
            Just(ToolbarAction::ClearFormatting),
            Just(ToolbarAction::Undo),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn toolbar_edits_survive_html_round_trip(
            actions in prop::collection::vec((action_strategy(), 0usize..4, 0usize..4, 0usize..6, 0usize..6), 1..12)
        ) {
            let mut s = Session::from_html("<p>alpha beta</p><p>gamma</p><p>delta epsilon</p><p>zeta</p>");
            for (action, a, b, ao, bo) in actions {
                let runs = s.tree().text_runs();
                if runs.is_empty() {
                    break;
                }
                let ra = runs[a % runs.len()];
                let rb = runs[b % runs.len()];
                let oa = ao.min(s.tree().text_len(ra));
                let ob = bo.min(s.tree().text_len(rb));
                s.set_selection(Some(Selection::new(Point::new(ra, oa), Point::new(rb, ob)))).unwrap();
                let before = s.html().to_string();
                match s.dispatch(&action) {
                    Ok(_) => {}
                    Err(CoreError::Validation(_)) => prop_assert_eq!(s.html(), before.as_str()),
                    Err(e) => return Err(TestCaseError::fail(e.to_string())),
                }
            }

            let html = scribe_html::serialize(s.tree());
            prop_assert_eq!(&html, s.html());
            let back = scribe_html::deserialize(&html);
            prop_assert_eq!(back.outline(), s.tree().outline());
        }
    }
}
