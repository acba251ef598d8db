//! HTML → tree.
//!
//! ## Learning: Tolerant Import
//!
//! Stored posts and pasted content are arbitrary HTML. The importer walks
//! the parsed DOM once and maps what it recognizes onto node kinds:
//!
//! - block tags become blocks, container tags (`div`, `section`, ...) are
//!   walked through transparently;
//! - loose inline content at block level is gathered into an implicit
//!   paragraph;
//! - anything unrecognized keeps its text and is reported as degraded.
//!
//! Nothing here returns an error: malformed markup is repaired by the
//! HTML5 parser before we ever see it.

use kuchikikiki::NodeRef;
use scribe_doc::{DocumentTree, FormatFlag, NodeId, NodeKind, TextStyle};
use tendril::TendrilSink;

use crate::{ImportReport, css};

/// Elements whose content is never imported.
const DROPPED: &[&str] = &[
    "script", "style", "img", "iframe", "object", "embed", "video", "audio", "canvas", "svg",
    "noscript", "template", "head", "title", "meta", "link", "input", "button", "select",
    "textarea", "hr",
];

/// Elements walked through as if their children sat in the parent.
const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "aside", "nav",
    "figure", "figcaption",
];

/// Parses HTML into a fresh tree.
pub fn deserialize(html: &str) -> DocumentTree {
    let mut tree = DocumentTree::new();
    deserialize_into(&mut tree, html);
    tree
}

/// Replaces the content of an existing tree with parsed HTML.
pub fn deserialize_into(tree: &mut DocumentTree, html: &str) -> ImportReport {
    tree.clear();

    let document = kuchikikiki::parse_html().one(html);
    let body = document
        .select_first("body")
        .map(|b| b.as_node().clone())
        .unwrap_or(document);

    let mut importer = Importer {
        tree,
        degraded: Vec::new(),
    };
    importer.blocks(&body);

    let Importer { tree, degraded } = importer;
    tree.normalize();

    let report = ImportReport {
        blocks: tree.children(tree.root()).len(),
        degraded,
    };
    tracing::debug!(
        blocks = report.blocks,
        degraded = report.degraded.len(),
        "imported html"
    );
    report
}

#[derive(Debug, Clone, Copy, Default)]
struct InlineContext {
    code: bool,
    in_link: bool,
}

struct Importer<'a> {
    tree: &'a mut DocumentTree,
    degraded: Vec<String>,
}

fn tag_of(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|el| el.name.local.as_ref().to_ascii_lowercase())
}

fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(str::to_string))
}

fn heading_level(tag: &str) -> Option<u8> {
    let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn is_block_tag(tag: &str) -> bool {
    matches!(tag, "p" | "blockquote" | "pre" | "ul" | "ol" | "li")
        || heading_level(tag).is_some()
        || CONTAINERS.contains(&tag)
}

/// Collapses whitespace that spans a line break outside code.
///
/// Serialized output never contains raw newlines outside `<pre>`, so these
/// only come from hand-written or pretty-printed markup.
fn collapse_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending.push(ch);
            continue;
        }
        flush_whitespace(&mut pending, &mut out);
        out.push(ch);
    }
    flush_whitespace(&mut pending, &mut out);
    out
}

fn flush_whitespace(pending: &mut String, out: &mut String) {
    if pending.contains(['\n', '\r']) {
        out.push(' ');
    } else {
        out.push_str(pending);
    }
    pending.clear();
}

impl Importer<'_> {
    fn degrade(&mut self, what: String) {
        tracing::debug!(element = %what, "degraded during import");
        if !self.degraded.contains(&what) {
            self.degraded.push(what);
        }
    }

    // ==================== Block Level ====================

    /// Walks children that belong directly under the root.
    fn blocks(&mut self, parent: &NodeRef) {
        let mut implicit: Option<NodeId> = None;

        for child in parent.children() {
            if let Some(text) = child.as_text() {
                let text = text.borrow().clone();
                if implicit.is_none() && text.trim().is_empty() {
                    continue;
                }
                let para = self.implicit_paragraph(&mut implicit);
                self.push_text(para, &text, &TextStyle::default(), InlineContext::default());
                continue;
            }
            let Some(tag) = tag_of(&child) else {
                continue;
            };

            if DROPPED.contains(&tag.as_str()) {
                self.degrade(tag);
                continue;
            }

            if CONTAINERS.contains(&tag.as_str()) {
                implicit = None;
                self.blocks(&child);
                continue;
            }

            let root = self.tree.root();
            let block = match tag.as_str() {
                "p" => Some(NodeKind::Paragraph),
                "blockquote" => Some(NodeKind::Quote),
                "pre" => Some(NodeKind::CodeBlock),
                "ul" => Some(NodeKind::ListUnordered),
                "ol" => Some(NodeKind::ListOrdered),
                t => heading_level(t).and_then(|l| NodeKind::heading(l).ok()),
            };

            match block {
                Some(kind) => {
                    implicit = None;
                    let is_list = kind.is_list();
                    let code = kind == NodeKind::CodeBlock;
                    let Ok(id) = self.tree.append(root, kind) else {
                        continue;
                    };
                    if is_list {
                        self.list(&child, id);
                    } else {
                        let ctx = InlineContext {
                            code,
                            in_link: false,
                        };
                        self.inline_children(&child, id, &TextStyle::default(), ctx);
                    }
                }
                None if tag == "li" => {
                    // A list item without a list gets one of its own.
                    implicit = None;
                    if let Ok(list) = self.tree.append(root, NodeKind::ListUnordered) {
                        self.list_item(&child, list);
                    }
                }
                None => {
                    let created = implicit.is_none();
                    let para = self.implicit_paragraph(&mut implicit);
                    self.inline(&child, para, &TextStyle::default(), InlineContext::default());
                    if created && self.tree.children(para).is_empty() {
                        let _ = self.tree.remove(para);
                        implicit = None;
                    }
                }
            }
        }
    }

    fn implicit_paragraph(&mut self, implicit: &mut Option<NodeId>) -> NodeId {
        if let Some(id) = *implicit {
            return id;
        }
        let root = self.tree.root();
        // Root always accepts a paragraph.
        let id = self
            .tree
            .append(root, NodeKind::Paragraph)
            .unwrap_or(root);
        *implicit = Some(id);
        id
    }

    // ==================== Lists ====================

    fn list(&mut self, node: &NodeRef, list: NodeId) {
        for child in node.children() {
            if let Some(text) = child.as_text() {
                let text = text.borrow().clone();
                if text.trim().is_empty() {
                    continue;
                }
                if let Ok(item) = self.tree.append(list, NodeKind::ListItem) {
                    self.push_text(item, &text, &TextStyle::default(), InlineContext::default());
                }
                continue;
            }
            let Some(tag) = tag_of(&child) else {
                continue;
            };
            match tag.as_str() {
                "li" => self.list_item(&child, list),
                "ul" | "ol" => {
                    // A stray nested list belongs to the previous item.
                    let item = match self.tree.children(list).last().copied() {
                        Some(item) => item,
                        None => match self.tree.append(list, NodeKind::ListItem) {
                            Ok(item) => item,
                            Err(_) => continue,
                        },
                    };
                    self.nested_list(&child, &tag, item);
                }
                t if DROPPED.contains(&t) => self.degrade(tag.clone()),
                _ => {
                    if let Ok(item) = self.tree.append(list, NodeKind::ListItem) {
                        self.inline(&child, item, &TextStyle::default(), InlineContext::default());
                    }
                }
            }
        }
    }

    fn list_item(&mut self, node: &NodeRef, list: NodeId) {
        if let Ok(item) = self.tree.append(list, NodeKind::ListItem) {
            self.inline_children(node, item, &TextStyle::default(), InlineContext::default());
        }
    }

    fn nested_list(&mut self, node: &NodeRef, tag: &str, item: NodeId) {
        let kind = if tag == "ol" {
            NodeKind::ListOrdered
        } else {
            NodeKind::ListUnordered
        };
        if let Ok(list) = self.tree.append(item, kind) {
            self.list(node, list);
        }
    }

    // ==================== Inline Level ====================

    fn inline_children(
        &mut self,
        node: &NodeRef,
        container: NodeId,
        style: &TextStyle,
        ctx: InlineContext,
    ) {
        for child in node.children() {
            self.inline(&child, container, style, ctx);
        }
    }

    fn inline(&mut self, node: &NodeRef, container: NodeId, style: &TextStyle, ctx: InlineContext) {
        if let Some(text) = node.as_text() {
            let text = text.borrow().clone();
            self.push_text(container, &text, style, ctx);
            return;
        }
        let Some(tag) = tag_of(node) else {
            return;
        };

        if DROPPED.contains(&tag.as_str()) {
            self.degrade(tag);
            return;
        }

        let mut inner = style.clone();
        match tag.as_str() {
            "strong" | "b" => inner.flags.set(FormatFlag::Bold, true),
            "em" | "i" => inner.flags.set(FormatFlag::Italic, true),
            "u" | "ins" => inner.flags.set(FormatFlag::Underline, true),
            "s" | "strike" | "del" => inner.flags.set(FormatFlag::Strikethrough, true),
            "sub" => inner.flags.set(FormatFlag::Subscript, true),
            "sup" => inner.flags.set(FormatFlag::Superscript, true),
            "span" | "code" => {}
            "font" => {
                if let Some(face) = attr(node, "face") {
                    inner.font_family = Some(face);
                }
                if let Some(color) = attr(node, "color") {
                    inner.color = Some(color);
                }
            }
            "br" => {
                self.push_run(container, "\n".to_string(), style);
                return;
            }
            "a" => {
                self.link(node, container, style, ctx);
                return;
            }
            "ul" | "ol" if self.tree.kind(container) == Some(&NodeKind::ListItem) => {
                self.nested_list(node, &tag, container);
                return;
            }
            t if is_block_tag(t) => {
                // Blocks nested where only inline content fits are flattened
                // onto their own line.
                if !self.tree.children(container).is_empty() {
                    self.push_run(container, "\n".to_string(), style);
                }
            }
            _ => self.degrade(tag.clone()),
        }

        if let Some(css) = attr(node, "style") {
            css::apply(&css, &mut inner);
        }
        self.inline_children(node, container, &inner, ctx);
    }

    fn link(&mut self, node: &NodeRef, container: NodeId, style: &TextStyle, ctx: InlineContext) {
        let href = attr(node, "href").unwrap_or_default();
        let mut inner = style.clone();
        if let Some(css) = attr(node, "style") {
            css::apply(&css, &mut inner);
        }

        if ctx.in_link || href.trim().is_empty() {
            self.inline_children(node, container, &inner, ctx);
            return;
        }
        match self.tree.append(container, NodeKind::link(href)) {
            Ok(link) => {
                let ctx = InlineContext {
                    in_link: true,
                    ..ctx
                };
                self.inline_children(node, link, &inner, ctx);
            }
            Err(_) => self.inline_children(node, container, &inner, ctx),
        }
    }

    fn push_text(&mut self, container: NodeId, text: &str, style: &TextStyle, ctx: InlineContext) {
        if ctx.code {
            self.push_run(container, text.to_string(), style);
            return;
        }
        if text.trim().is_empty() && text.contains('\n') {
            return;
        }
        self.push_run(container, collapse_breaks(text), style);
    }

    fn push_run(&mut self, container: NodeId, text: String, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let kind = NodeKind::styled_text(text, style.clone());
        if let Err(e) = self.tree.append(container, kind) {
            tracing::debug!(error = %e, "dropping text run");
        }
    }
}
