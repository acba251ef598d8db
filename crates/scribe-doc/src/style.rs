//! Inline text styles.
//!
//! A `TextStyle` is a plain value: six boolean format flags plus four
//! optional CSS-like properties. Partial updates are expressed with a
//! `StylePatch`, where every field says whether to keep, clear or set.

use serde::{Deserialize, Serialize};

/// A boolean inline format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
}

impl FormatFlag {
    /// All flags, in serialization order.
    pub const ALL: [FormatFlag; 6] = [
        FormatFlag::Bold,
        FormatFlag::Italic,
        FormatFlag::Underline,
        FormatFlag::Strikethrough,
        FormatFlag::Subscript,
        FormatFlag::Superscript,
    ];

    /// Parses a flag name such as `"bold"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bold" => Some(FormatFlag::Bold),
            "italic" => Some(FormatFlag::Italic),
            "underline" => Some(FormatFlag::Underline),
            "strikethrough" | "strike" => Some(FormatFlag::Strikethrough),
            "subscript" | "sub" => Some(FormatFlag::Subscript),
            "superscript" | "sup" => Some(FormatFlag::Superscript),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FormatFlag::Bold => "bold",
            FormatFlag::Italic => "italic",
            FormatFlag::Underline => "underline",
            FormatFlag::Strikethrough => "strikethrough",
            FormatFlag::Subscript => "subscript",
            FormatFlag::Superscript => "superscript",
        }
    }
}

/// The set of boolean formats on a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub subscript: bool,
    pub superscript: bool,
}

impl FormatFlags {
    /// Returns the value of a single flag.
    pub fn get(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.bold,
            FormatFlag::Italic => self.italic,
            FormatFlag::Underline => self.underline,
            FormatFlag::Strikethrough => self.strikethrough,
            FormatFlag::Subscript => self.subscript,
            FormatFlag::Superscript => self.superscript,
        }
    }

    /// Sets a single flag.
    ///
    /// Subscript and superscript are mutually exclusive; turning one on
    /// turns the other off.
    pub fn set(&mut self, flag: FormatFlag, on: bool) {
        match flag {
            FormatFlag::Bold => self.bold = on,
            FormatFlag::Italic => self.italic = on,
            FormatFlag::Underline => self.underline = on,
            FormatFlag::Strikethrough => self.strikethrough = on,
            FormatFlag::Subscript => {
                self.subscript = on;
                if on {
                    self.superscript = false;
                }
            }
            FormatFlag::Superscript => {
                self.superscript = on;
                if on {
                    self.subscript = false;
                }
            }
        }
    }

    /// Returns true if no flag is set.
    pub fn is_empty(&self) -> bool {
        FormatFlag::ALL.iter().all(|f| !self.get(*f))
    }

    /// Flag-wise AND, used to compute "true for every run".
    pub fn intersect(&self, other: &FormatFlags) -> FormatFlags {
        let mut out = FormatFlags::default();
        for flag in FormatFlag::ALL {
            out.set(flag, self.get(flag) && other.get(flag));
        }
        out
    }
}

/// A style property carrying a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    FontFamily,
    FontSize,
    Color,
    BackgroundColor,
}

impl StyleProperty {
    /// The CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::FontFamily => "font-family",
            StyleProperty::FontSize => "font-size",
            StyleProperty::Color => "color",
            StyleProperty::BackgroundColor => "background-color",
        }
    }

    /// Parses a CSS property name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "font-family" => Some(StyleProperty::FontFamily),
            "font-size" => Some(StyleProperty::FontSize),
            "color" => Some(StyleProperty::Color),
            "background-color" | "background" => Some(StyleProperty::BackgroundColor),
            _ => None,
        }
    }
}

/// Full inline style of a text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub flags: FormatFlags,
    pub font_family: Option<String>,
    pub font_size_px: Option<u32>,
    pub color: Option<String>,
    pub background_color: Option<String>,
}

impl TextStyle {
    /// Shorthand for a style with only bold set.
    pub fn bold() -> Self {
        let mut style = Self::default();
        style.flags.bold = true;
        style
    }

    /// Returns true for the default (unstyled) style.
    pub fn is_plain(&self) -> bool {
        *self == TextStyle::default()
    }

    /// Returns true if any of the CSS-like properties is set.
    pub fn has_properties(&self) -> bool {
        self.font_family.is_some()
            || self.font_size_px.is_some()
            || self.color.is_some()
            || self.background_color.is_some()
    }

    /// Applies a patch, returning true if anything changed.
    pub fn apply(&mut self, patch: &StylePatch) -> bool {
        let before = self.clone();
        for (flag, value) in &patch.flags {
            self.flags.set(*flag, *value);
        }
        patch.font_family.apply_to(&mut self.font_family);
        patch.font_size_px.apply_to(&mut self.font_size_px);
        patch.color.apply_to(&mut self.color);
        patch.background_color.apply_to(&mut self.background_color);
        *self != before
    }
}

/// How a patch treats one optional property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Change<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T: Clone> Change<T> {
    fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            Change::Keep => {}
            Change::Clear => *slot = None,
            Change::Set(v) => *slot = Some(v.clone()),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Change::Keep)
    }
}

/// A partial style update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePatch {
    /// Flags to force on or off, applied in order.
    pub flags: Vec<(FormatFlag, bool)>,
    pub font_family: Change<String>,
    pub font_size_px: Change<u32>,
    pub color: Change<String>,
    pub background_color: Change<String>,
}

impl StylePatch {
    /// A patch that sets one flag.
    pub fn flag(flag: FormatFlag, on: bool) -> Self {
        Self {
            flags: vec![(flag, on)],
            ..Self::default()
        }
    }

    /// Returns true if the patch does nothing.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
            && self.font_family.is_keep()
            && self.font_size_px.is_keep()
            && self.color.is_keep()
            && self.background_color.is_keep()
    }

    /// Folds a later patch into this one; later entries win.
    pub fn merge(&mut self, later: StylePatch) {
        for (flag, on) in later.flags {
            self.flags.retain(|(f, _)| *f != flag);
            self.flags.push((flag, on));
        }
        if !later.font_family.is_keep() {
            self.font_family = later.font_family;
        }
        if !later.font_size_px.is_keep() {
            self.font_size_px = later.font_size_px;
        }
        if !later.color.is_keep() {
            self.color = later.color;
        }
        if !later.background_color.is_keep() {
            self.background_color = later.background_color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_and_super_are_exclusive() {
        let mut flags = FormatFlags::default();
        flags.set(FormatFlag::Subscript, true);
        flags.set(FormatFlag::Superscript, true);
        assert!(flags.superscript);
        assert!(!flags.subscript);
    }

    #[test]
    fn test_apply_patch_reports_change() {
        let mut style = TextStyle::default();
        let patch = StylePatch {
            font_family: Change::Set("Georgia".to_string()),
            ..StylePatch::default()
        };
        assert!(style.apply(&patch));
        assert!(!style.apply(&patch));
        assert_eq!(style.font_family.as_deref(), Some("Georgia"));

        let clear = StylePatch {
            font_family: Change::Clear,
            ..StylePatch::default()
        };
        assert!(style.apply(&clear));
        assert!(style.is_plain());
    }

    #[test]
    fn test_patch_merge_later_wins() {
        let mut patch = StylePatch::flag(FormatFlag::Bold, true);
        patch.merge(StylePatch::flag(FormatFlag::Bold, false));
        assert_eq!(patch.flags, vec![(FormatFlag::Bold, false)]);
    }
}
