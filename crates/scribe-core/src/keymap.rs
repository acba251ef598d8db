//! Keyboard shortcuts for toolbar actions.
//!
//! ## Learning: Data-Driven Bindings
//!
//! The default shortcuts are a table of strings parsed by the same code
//! that reads user bindings from config. There is one parser and one
//! lookup table, so a user binding can override a default simply by
//! naming the same chord.

use std::collections::HashMap;
use std::fmt;

use crate::command::ToolbarAction;
use crate::config::Config;

/// Built-in shortcuts, as `chord = action` strings.
const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("ctrl+b", "format.bold"),
    ("ctrl+i", "format.italic"),
    ("ctrl+u", "format.underline"),
    ("ctrl+shift+x", "format.strikethrough"),
    ("ctrl+\\", "format.clear"),
    ("ctrl+alt+0", "block.p"),
    ("ctrl+alt+1", "block.h1"),
    ("ctrl+alt+2", "block.h2"),
    ("ctrl+alt+3", "block.h3"),
    ("ctrl+shift+8", "block.ul"),
    ("ctrl+shift+7", "block.ol"),
    ("tab", "indent.increase"),
    ("shift+tab", "indent.decrease"),
    ("ctrl+z", "history.undo"),
    ("ctrl+y", "history.redo"),
    ("ctrl+shift+z", "history.redo"),
];

/// Held modifier keys, as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(1);
    pub const ALT: Modifiers = Modifiers(1 << 1);
    pub const SHIFT: Modifiers = Modifiers(1 << 2);
    /// Cmd on macOS.
    pub const META: Modifiers = Modifiers(1 << 3);

    /// Display order and names.
    const NAMED: [(Modifiers, &'static str); 4] = [
        (Modifiers::CTRL, "Ctrl"),
        (Modifiers::ALT, "Alt"),
        (Modifiers::SHIFT, "Shift"),
        (Modifiers::META, "Meta"),
    ];

    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn from_name(name: &str) -> Option<Modifiers> {
        match name {
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" | "option" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            "meta" | "cmd" | "super" => Some(Modifiers::META),
            _ => None,
        }
    }
}

/// The non-modifier key of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, always lowercase.
    Char(char),
    Tab,
    Enter,
    Space,
}

impl Key {
    /// A character key; case is folded so `Shift+Z` and `Shift+z` match.
    pub fn char(c: char) -> Key {
        Key::Char(c.to_lowercase().next().unwrap_or(c))
    }

    fn from_name(name: &str) -> Option<Key> {
        match name {
            "tab" => Some(Key::Tab),
            "enter" | "return" => Some(Key::Enter),
            "space" => Some(Key::Space),
            _ => {
                let mut chars = name.chars();
                let c = chars.next()?;
                chars.next().is_none().then(|| Key::char(c))
            }
        }
    }
}

/// A key with its modifiers, e.g. `Ctrl+Shift+Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parses a chord like `ctrl+b` or `Shift+Tab`.
    ///
    /// The last `+`-separated part is the key; the rest must be modifiers.
    pub fn parse(chord: &str) -> Option<Self> {
        let lower = chord.trim().to_lowercase();
        let (mods, key) = match lower.rsplit_once('+') {
            Some((mods, key)) => (Some(mods), key),
            None => (None, lower.as_str()),
        };

        let mut modifiers = Modifiers::NONE;
        for name in mods.into_iter().flat_map(|m| m.split('+')) {
            modifiers = modifiers.union(Modifiers::from_name(name.trim())?);
        }
        Some(Self::new(Key::from_name(key.trim())?, modifiers))
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (modifier, name) in Modifiers::NAMED {
            if self.modifiers.contains(modifier) {
                write!(f, "{name}+")?;
            }
        }
        match self.key {
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Tab => f.write_str("Tab"),
            Key::Enter => f.write_str("Enter"),
            Key::Space => f.write_str("Space"),
        }
    }
}

/// Chord-to-action lookup.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyPress, ToolbarAction>,
}

impl Keymap {
    /// The built-in shortcuts.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        for (chord, action) in DEFAULT_BINDINGS {
            keymap.bind_str(chord, action);
        }
        keymap
    }

    /// Built-in shortcuts overlaid with `[keyboard.bindings]` from config.
    ///
    /// Unparseable bindings are skipped with a warning.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();
        for (chord, action) in &config.keyboard.bindings {
            keymap.bind_str(chord, action);
        }
        keymap
    }

    fn bind_str(&mut self, chord: &str, action: &str) -> bool {
        let Some(key) = KeyPress::parse(chord) else {
            tracing::warn!("Ignoring binding with unknown chord: {}", chord);
            return false;
        };
        match ToolbarAction::parse(action) {
            Ok(action) => {
                self.bind(key, action);
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring binding {}: {}", chord, e);
                false
            }
        }
    }

    /// Adds or replaces a binding.
    pub fn bind(&mut self, key: KeyPress, action: ToolbarAction) {
        self.bindings.insert(key, action);
    }

    /// The action bound to a key press, if any.
    pub fn lookup(&self, key: &KeyPress) -> Option<&ToolbarAction> {
        self.bindings.get(key)
    }

    /// `(chord, action name)` pairs sorted by chord, for help screens.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut out: Vec<_> = self
            .bindings
            .iter()
            .map(|(k, a)| (k.to_string(), a.display_name()))
            .collect();
        out.sort();
        out
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::IndentDirection;
    use crate::toolbar::BlockType;
    use scribe_doc::FormatFlag;

    #[test]
    fn test_chord_parsing() {
        let kp = KeyPress::parse("Ctrl+Shift+Z").unwrap();
        assert_eq!(kp.key, Key::Char('z'));
        assert!(kp.modifiers.contains(Modifiers::CTRL.union(Modifiers::SHIFT)));
        assert!(!kp.modifiers.contains(Modifiers::ALT));
        assert_eq!(kp.to_string(), "Ctrl+Shift+Z");

        assert_eq!(KeyPress::parse("tab"), Some(KeyPress::new(Key::Tab, Modifiers::NONE)));
        assert_eq!(KeyPress::parse("hyper+b"), None);
        assert_eq!(KeyPress::parse("ctrl+"), None);
    }

    #[test]
    fn test_defaults_all_parse() {
        let keymap = Keymap::new();
        assert_eq!(keymap.bindings.len(), DEFAULT_BINDINGS.len());
        assert_eq!(
            keymap.lookup(&KeyPress::new(Key::char('B'), Modifiers::CTRL)),
            Some(&ToolbarAction::ToggleFormat(FormatFlag::Bold))
        );
        assert_eq!(
            keymap.lookup(&KeyPress::new(Key::Tab, Modifiers::SHIFT)),
            Some(&ToolbarAction::Indent(IndentDirection::Decrease))
        );
        assert_eq!(keymap.lookup(&KeyPress::new(Key::char('q'), Modifiers::CTRL)), None);
    }

    #[test]
    fn test_config_overrides_and_skips_bad_entries() {
        let mut config = Config::default();
        let bindings = &mut config.keyboard.bindings;
        bindings.insert("ctrl+b".to_string(), "block.code".to_string());
        bindings.insert("ctrl+q".to_string(), "not.an.action".to_string());
        bindings.insert("wat+q".to_string(), "format.bold".to_string());

        let keymap = Keymap::from_config(&config);
        assert_eq!(
            keymap.lookup(&KeyPress::parse("ctrl+b").unwrap()),
            Some(&ToolbarAction::SetBlockType(BlockType::Code))
        );
        assert_eq!(keymap.lookup(&KeyPress::parse("ctrl+q").unwrap()), None);
    }

    #[test]
    fn test_describe_is_sorted() {
        let described = Keymap::new().describe();
        assert!(described.windows(2).all(|w| w[0] <= w[1]));
        assert!(described.contains(&("Ctrl+B".to_string(), "Toggle bold".to_string())));
    }
}
