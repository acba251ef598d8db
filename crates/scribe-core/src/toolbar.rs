//! Toolbar state derivation.
//!
//! ## Learning: Derived State
//!
//! The toolbar never holds state of its own. After every selection change
//! or committed mutation, `ToolbarState::derive` projects the tree and
//! selection onto the values the widgets show. Nothing can drift out of
//! sync because nothing is stored twice.

use serde::Serialize;

use scribe_doc::{
    Change, DocumentTree, FormatFlags, HeadingLevel, NodeId, NodeKind, Selection, StylePatch,
    TextStyle,
};

use crate::config::EditorConfig;
use crate::{CoreError, CoreResult};

/// The block type shown in (and chosen from) the block selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    Code,
    BulletList,
    NumberedList,
}

impl BlockType {
    /// Parses a selector value: `p`, `h1`..`h6`, `blockquote`, `code`,
    /// `ul`, `ol` (long names accepted too).
    pub fn parse(s: &str) -> CoreResult<Self> {
        let lower = s.trim().to_lowercase();
        let block = match lower.as_str() {
            "p" | "paragraph" | "normal" => BlockType::Paragraph,
            "blockquote" | "quote" => BlockType::Quote,
            "pre" | "code" => BlockType::Code,
            "ul" | "bullet" | "unordered" => BlockType::BulletList,
            "ol" | "numbered" | "ordered" => BlockType::NumberedList,
            other => {
                let level = other
                    .strip_prefix('h')
                    .and_then(|n| n.parse::<u8>().ok())
                    .ok_or_else(|| CoreError::Validation(format!("unknown block type '{s}'")))?;
                BlockType::Heading(HeadingLevel::new(level)?)
            }
        };
        Ok(block)
    }

    /// The block type a node reports.
    pub fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Paragraph => Some(BlockType::Paragraph),
            NodeKind::Heading { level } => Some(BlockType::Heading(*level)),
            NodeKind::Quote => Some(BlockType::Quote),
            NodeKind::CodeBlock => Some(BlockType::Code),
            NodeKind::ListUnordered => Some(BlockType::BulletList),
            NodeKind::ListOrdered => Some(BlockType::NumberedList),
            _ => None,
        }
    }

    /// The node kind this type produces: the block itself, or the list
    /// container for list types.
    pub fn node_kind(self) -> NodeKind {
        match self {
            BlockType::Paragraph => NodeKind::Paragraph,
            BlockType::Heading(level) => NodeKind::Heading { level },
            BlockType::Quote => NodeKind::Quote,
            BlockType::Code => NodeKind::CodeBlock,
            BlockType::BulletList => NodeKind::ListUnordered,
            BlockType::NumberedList => NodeKind::ListOrdered,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::BulletList | BlockType::NumberedList)
    }

    pub fn name(self) -> String {
        match self {
            BlockType::Paragraph => "paragraph".to_string(),
            BlockType::Heading(level) => format!("heading {}", level.get()),
            BlockType::Quote => "quote".to_string(),
            BlockType::Code => "code".to_string(),
            BlockType::BulletList => "bullet list".to_string(),
            BlockType::NumberedList => "numbered list".to_string(),
        }
    }
}

/// Snapshot of everything the toolbar displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    pub block_type: Option<BlockType>,
    pub flags: FormatFlags,
    pub font_family: Option<String>,
    pub font_size_px: Option<u32>,
    pub font_color: Option<String>,
    pub background_color: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// What the font selectors offer, and what they show for unstyled text.
///
/// Empty `families`/`sizes` lists accept any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontOptions {
    pub default_family: Option<String>,
    pub default_size_px: Option<u32>,
    pub families: Vec<String>,
    pub sizes: Vec<u32>,
}

impl FontOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        let family = config.default_font_family.trim();
        Self {
            default_family: (!family.is_empty()).then(|| family.to_string()),
            default_size_px: (config.default_font_size_px > 0).then_some(config.default_font_size_px),
            families: config.font_families.clone(),
            sizes: config.font_sizes.clone(),
        }
    }

    /// Resolves a selector value to an offered family, in its listed spelling.
    pub fn family(&self, value: &str) -> CoreResult<String> {
        if !scribe_html::is_plain_value(value) {
            return Err(CoreError::Validation(format!("invalid font family '{value}'")));
        }
        if self.families.is_empty() {
            return Ok(value.to_string());
        }
        self.families
            .iter()
            .find(|f| f.eq_ignore_ascii_case(value))
            .cloned()
            .ok_or_else(|| CoreError::Validation(format!("font family '{value}' is not offered")))
    }

    /// Parses a size such as `15px` and checks it is offered.
    pub fn size(&self, value: &str) -> CoreResult<u32> {
        let px = scribe_html::parse_px(value)
            .ok_or_else(|| CoreError::Validation(format!("font size '{value}' is not a pixel size")))?;
        if self.sizes.is_empty() || self.sizes.contains(&px) {
            Ok(px)
        } else {
            Err(CoreError::Validation(format!("font size {px}px is not offered")))
        }
    }

    /// Fills unset font properties with the defaults.
    fn fill(&self, style: &TextStyle) -> TextStyle {
        let mut style = style.clone();
        if style.font_family.is_none() {
            style.font_family = self.default_family.clone();
        }
        if style.font_size_px.is_none() {
            style.font_size_px = self.default_size_px;
        }
        style
    }
}

impl ToolbarState {
    /// Projects tree, selection and pending caret style onto toolbar values.
    pub fn derive(
        tree: &DocumentTree,
        selection: Option<&Selection>,
        pending: &StylePatch,
        fonts: &FontOptions,
        can_undo: bool,
        can_redo: bool,
    ) -> Self {
        let mut state = ToolbarState {
            can_undo,
            can_redo,
            ..Self::default()
        };
        let Some(range) = selection.and_then(|s| s.resolve(tree)) else {
            return state;
        };

        state.block_type = tree
            .closest(range.start.node, |k| k.is_block() || *k == NodeKind::ListItem)
            .and_then(|block| match tree.kind(block) {
                Some(NodeKind::ListItem) => tree.parent(block).and_then(|l| tree.kind(l)),
                other => other,
            })
            .and_then(BlockType::of);

        let styles: Vec<TextStyle> = if range.is_collapsed() {
            caret_run(tree, range.start.node, range.start.offset)
                .and_then(|run| tree.get(run).and_then(|n| n.style()))
                .map(|style| fonts.fill(style))
                .into_iter()
                .collect()
        } else {
            range
                .run_slices(tree)
                .iter()
                .filter_map(|slice| tree.get(slice.run).and_then(|n| n.style()))
                .map(|style| fonts.fill(style))
                .collect()
        };

        let mut shared = if styles.is_empty() {
            fonts.fill(&TextStyle::default())
        } else {
            shared_style(&styles)
        };
        shared.apply(pending);
        if pending.font_family == Change::Clear {
            shared.font_family = fonts.default_family.clone();
        }
        if pending.font_size_px == Change::Clear {
            shared.font_size_px = fonts.default_size_px;
        }

        state.flags = shared.flags;
        state.font_family = shared.font_family;
        state.font_size_px = shared.font_size_px;
        state.font_color = shared.color;
        state.background_color = shared.background_color;
        state
    }
}

/// The run whose style a caret at `(node, offset)` would type with.
pub(crate) fn caret_run(tree: &DocumentTree, node: NodeId, offset: usize) -> Option<NodeId> {
    match tree.kind(node)? {
        NodeKind::TextRun { .. } => Some(node),
        _ => {
            let runs = tree.text_runs_under(node);
            if offset == 0 {
                runs.first().copied()
            } else {
                runs.last().copied()
            }
        }
    }
}

/// Flags true for every style; properties kept only when all agree.
fn shared_style(styles: &[TextStyle]) -> TextStyle {
    let Some((first, rest)) = styles.split_first() else {
        return TextStyle::default();
    };
    let mut shared = first.clone();
    for style in rest {
        shared.flags = shared.flags.intersect(&style.flags);
        if shared.font_family != style.font_family {
            shared.font_family = None;
        }
        if shared.font_size_px != style.font_size_px {
            shared.font_size_px = None;
        }
        if shared.color != style.color {
            shared.color = None;
        }
        if shared.background_color != style.background_color {
            shared.background_color = None;
        }
    }
    shared
}
