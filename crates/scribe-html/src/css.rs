//! Inline `style` attribute handling.
//!
//! Only the handful of declarations the editor produces are understood;
//! everything else is ignored.

use scribe_doc::{FormatFlag, TextStyle};

/// Renders the span-level part of a style as a CSS declaration list.
///
/// Declaration order is fixed so output is byte-stable.
pub(crate) fn render(style: &TextStyle) -> Option<String> {
    let mut decls = Vec::new();

    let decoration = match (style.flags.underline, style.flags.strikethrough) {
        (true, true) => Some("underline line-through"),
        (true, false) => Some("underline"),
        (false, true) => Some("line-through"),
        (false, false) => None,
    };
    if let Some(decoration) = decoration {
        decls.push(format!("text-decoration: {decoration}"));
    }
    if let Some(family) = &style.font_family {
        decls.push(format!("font-family: {family}"));
    }
    if let Some(size) = style.font_size_px {
        decls.push(format!("font-size: {size}px"));
    }
    if let Some(color) = &style.color {
        decls.push(format!("color: {color}"));
    }
    if let Some(background) = &style.background_color {
        decls.push(format!("background-color: {background}"));
    }

    if decls.is_empty() {
        None
    } else {
        Some(decls.join("; "))
    }
}

/// Parses a pixel size such as `"15px"`, `"15"` or `"15.4px"`.
pub fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let parsed: f32 = number.parse().ok()?;
    if parsed.is_finite() && parsed > 0.0 {
        Some(parsed.round() as u32)
    } else {
        None
    }
}

/// True if `value` can sit in one declaration and be read back unchanged.
///
/// Rejects declaration and block delimiters, comment openers, and control
/// characters, plus padding that `apply` would trim away.
pub fn is_plain_value(value: &str) -> bool {
    !value.is_empty()
        && value.trim() == value
        && !value.contains("/*")
        && !value
            .chars()
            .any(|c| matches!(c, ';' | '{' | '}') || c.is_control())
}

/// Folds a `style` attribute into an inherited style.
pub(crate) fn apply(css: &str, style: &mut TextStyle) {
    for decl in css.split(';') {
        let Some((property, value)) = decl.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let lower = value.to_ascii_lowercase();

        match property.as_str() {
            "font-weight" => {
                let bold = match lower.as_str() {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    n => n.parse::<u32>().is_ok_and(|w| w >= 600),
                };
                style.flags.set(FormatFlag::Bold, bold);
            }
            "font-style" => {
                style
                    .flags
                    .set(FormatFlag::Italic, lower == "italic" || lower == "oblique");
            }
            "text-decoration" | "text-decoration-line" => {
                if lower == "none" {
                    style.flags.set(FormatFlag::Underline, false);
                    style.flags.set(FormatFlag::Strikethrough, false);
                } else {
                    if lower.contains("underline") {
                        style.flags.set(FormatFlag::Underline, true);
                    }
                    if lower.contains("line-through") {
                        style.flags.set(FormatFlag::Strikethrough, true);
                    }
                }
            }
            "vertical-align" => match lower.as_str() {
                "sub" => style.flags.set(FormatFlag::Subscript, true),
                "super" => style.flags.set(FormatFlag::Superscript, true),
                _ => {}
            },
            "font-family" => style.font_family = Some(value.to_string()),
            "font-size" => match parse_px(&lower) {
                Some(px) => style.font_size_px = Some(px),
                None => tracing::debug!(value, "ignoring non-pixel font size"),
            },
            "color" => style.color = Some(value.to_string()),
            "background-color" | "background" => {
                style.background_color = Some(value.to_string())
            }
            _ => {}
        }
    }
}
