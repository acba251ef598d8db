//! Tree → HTML.
//!
//! Output is a deterministic function of the outline: ids never leak into
//! the markup, and wrapper tags are always emitted in the same order.

use html_escape::{encode_double_quoted_attribute, encode_text};
use scribe_doc::{DocumentTree, NodeId, NodeKind, TextStyle};

use crate::css;

/// Serializes every block under the root.
pub fn serialize(tree: &DocumentTree) -> String {
    let mut out = String::new();
    for block in tree.children(tree.root()) {
        write_block(tree, *block, &mut out);
    }
    out
}

fn write_block(tree: &DocumentTree, id: NodeId, out: &mut String) {
    let Some(kind) = tree.kind(id) else {
        return;
    };
    match kind {
        NodeKind::Paragraph => wrap_inline(tree, id, "p", out),
        NodeKind::Heading { level } => wrap_inline(tree, id, level.tag(), out),
        NodeKind::Quote => wrap_inline(tree, id, "blockquote", out),
        NodeKind::CodeBlock => {
            out.push_str("<pre><code>");
            write_children_inline(tree, id, true, out);
            out.push_str("</code></pre>");
        }
        NodeKind::ListOrdered | NodeKind::ListUnordered => {
            let tag = if *kind == NodeKind::ListOrdered { "ol" } else { "ul" };
            out.push('<');
            out.push_str(tag);
            out.push('>');
            for item in tree.children(id) {
                write_block(tree, *item, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::ListItem => {
            out.push_str("<li>");
            for child in tree.children(id) {
                match tree.kind(*child) {
                    Some(k) if k.is_list() => write_block(tree, *child, out),
                    Some(_) => write_inline(tree, *child, false, out),
                    None => {}
                }
            }
            out.push_str("</li>");
        }
        NodeKind::Root | NodeKind::Link { .. } | NodeKind::TextRun { .. } => {
            write_inline(tree, id, false, out)
        }
    }
}

fn wrap_inline(tree: &DocumentTree, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_children_inline(tree, id, false, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_children_inline(tree: &DocumentTree, id: NodeId, code: bool, out: &mut String) {
    for child in tree.children(id) {
        write_inline(tree, *child, code, out);
    }
}

fn write_inline(tree: &DocumentTree, id: NodeId, code: bool, out: &mut String) {
    match tree.kind(id) {
        Some(NodeKind::TextRun { text, style }) => write_run(text, style, code, out),
        Some(NodeKind::Link { href }) => {
            out.push_str("<a href=\"");
            out.push_str(&encode_double_quoted_attribute(href));
            out.push_str("\">");
            write_children_inline(tree, id, code, out);
            out.push_str("</a>");
        }
        _ => {}
    }
}

/// Writes one run inside its wrappers: `strong > em > sub > sup > span`.
fn write_run(text: &str, style: &TextStyle, code: bool, out: &mut String) {
    let mut close: Vec<&str> = Vec::new();

    if style.flags.bold {
        out.push_str("<strong>");
        close.push("</strong>");
    }
    if style.flags.italic {
        out.push_str("<em>");
        close.push("</em>");
    }
    if style.flags.subscript {
        out.push_str("<sub>");
        close.push("</sub>");
    }
    if style.flags.superscript {
        out.push_str("<sup>");
        close.push("</sup>");
    }
    if let Some(decls) = css::render(style) {
        out.push_str("<span style=\"");
        out.push_str(&encode_double_quoted_attribute(&decls));
        out.push_str("\">");
        close.push("</span>");
    }

    if code {
        out.push_str(&encode_text(text));
    } else {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push_str("<br>");
            }
            out.push_str(&encode_text(line));
        }
    }

    for tag in close.iter().rev() {
        out.push_str(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_doc::FormatFlag;

    #[test]
    fn test_heading_and_paragraph() {
        let mut tree = DocumentTree::new();
        let h = tree.append(tree.root(), NodeKind::heading(1).unwrap()).unwrap();
        tree.append(h, NodeKind::text("Title")).unwrap();
        let p = tree.append(tree.root(), NodeKind::Paragraph).unwrap();
        tree.append(p, NodeKind::text("Hello ")).unwrap();
        tree.append(p, NodeKind::styled_text("world", TextStyle::bold()))
            .unwrap();

        assert_eq!(
            serialize(&tree),
            "<h1>Title</h1><p>Hello <strong>world</strong></p>"
        );
    }

    #[test]
    fn test_wrapper_order() {
        let mut style = TextStyle::bold();
        style.flags.set(FormatFlag::Italic, true);
        style.flags.set(FormatFlag::Superscript, true);
        style.color = Some("red".to_string());

        let mut out = String::new();
        write_run("x", &style, false, &mut out);
        assert_eq!(
            out,
            "<strong><em><sup><span style=\"color: red\">x</span></sup></em></strong>"
        );
    }

    #[test]
    fn test_escaping_and_line_breaks() {
        let mut tree = DocumentTree::new();
        let p = tree.append(tree.root(), NodeKind::Paragraph).unwrap();
        tree.append(p, NodeKind::text("a < b\n& c")).unwrap();
        let code = tree.append(tree.root(), NodeKind::CodeBlock).unwrap();
        tree.append(code, NodeKind::text("if a < b {\n}")).unwrap();

        assert_eq!(
            serialize(&tree),
            "<p>a &lt; b<br>&amp; c</p><pre><code>if a &lt; b {\n}</code></pre>"
        );
    }

    #[test]
    fn test_nested_list_and_link() {
        let mut tree = DocumentTree::new();
        let list = tree.append(tree.root(), NodeKind::ListUnordered).unwrap();
        let item = tree.append(list, NodeKind::ListItem).unwrap();
        let link = tree
            .append(item, NodeKind::link("https://example.com/?a=1&b=\"2\""))
            .unwrap();
        tree.append(link, NodeKind::text("site")).unwrap();
        let nested = tree.append(item, NodeKind::ListOrdered).unwrap();
        let inner = tree.append(nested, NodeKind::ListItem).unwrap();
        tree.append(inner, NodeKind::text("child")).unwrap();

        assert_eq!(
            serialize(&tree),
            "<ul><li><a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">site</a>\
             <ol><li>child</li></ol></li></ul>"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(serialize(&DocumentTree::new()), "");
    }
}
