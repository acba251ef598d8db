//! Toolbar command dispatch.
//!
//! ## Learning: The Command Pattern
//!
//! Every toolbar button, selector and shortcut produces a `ToolbarAction`
//! value. Because actions are plain data they can be bound to keys, read
//! from config strings, replayed in tests and logged, and a single
//! `dispatch` entry point walks each one through the same phases:
//!
//! ```text
//! Idle → ActionInvoked → TreeMutated → UIStateRecomputed → Idle
//! ```

use scribe_doc::{FormatFlag, StyleProperty};

use crate::lists::IndentDirection;
use crate::session::Session;
use crate::toolbar::BlockType;
use crate::{CoreError, CoreResult};

/// A discrete user action from the toolbar or keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    ToggleFormat(FormatFlag),
    SetBlockType(BlockType),
    /// `None` or an empty value clears the property.
    SetStyleProperty {
        property: StyleProperty,
        value: Option<String>,
    },
    Indent(IndentDirection),
    InsertEmoji(String),
    InsertText(String),
    ClearFormatting,
    /// `Some(href)` wraps the selection, `None` unwraps.
    ToggleLink(Option<String>),
    Undo,
    Redo,
}

impl ToolbarAction {
    /// Returns the action's display name.
    pub fn display_name(&self) -> String {
        match self {
            ToolbarAction::ToggleFormat(flag) => format!("Toggle {}", flag.name()),
            ToolbarAction::SetBlockType(block) => format!("Set {}", block.name()),
            ToolbarAction::SetStyleProperty { property, .. } => {
                format!("Set {}", property.css_name())
            }
            ToolbarAction::Indent(IndentDirection::Increase) => "Increase Indent".to_string(),
            ToolbarAction::Indent(IndentDirection::Decrease) => "Decrease Indent".to_string(),
            ToolbarAction::InsertEmoji(_) => "Insert Emoji".to_string(),
            ToolbarAction::InsertText(_) => "Insert Text".to_string(),
            ToolbarAction::ClearFormatting => "Clear Formatting".to_string(),
            ToolbarAction::ToggleLink(Some(_)) => "Insert Link".to_string(),
            ToolbarAction::ToggleLink(None) => "Remove Link".to_string(),
            ToolbarAction::Undo => "Undo".to_string(),
            ToolbarAction::Redo => "Redo".to_string(),
        }
    }

    /// Parses a command string such as `format.bold`, `block.h2`,
    /// `style.color=#333`, `indent.increase` or `history.undo`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };
        let unknown = || CoreError::UnknownAction(s.to_string());
        let (group, item) = name.split_once('.').ok_or_else(unknown)?;

        let action = match (group, item) {
            ("format", "clear") => ToolbarAction::ClearFormatting,
            ("format", flag) => ToolbarAction::ToggleFormat(FormatFlag::parse(flag).ok_or_else(unknown)?),
            ("block", block) => ToolbarAction::SetBlockType(BlockType::parse(block)?),
            ("style", property) => ToolbarAction::SetStyleProperty {
                property: StyleProperty::parse(property).ok_or_else(unknown)?,
                value: arg.filter(|v| !v.is_empty()).map(str::to_string),
            },
            ("indent", "increase") => ToolbarAction::Indent(IndentDirection::Increase),
            ("indent", "decrease") => ToolbarAction::Indent(IndentDirection::Decrease),
            ("insert", "emoji") => ToolbarAction::InsertEmoji(arg.ok_or_else(unknown)?.to_string()),
            ("insert", "text") => ToolbarAction::InsertText(arg.ok_or_else(unknown)?.to_string()),
            ("link", "set") => ToolbarAction::ToggleLink(Some(arg.ok_or_else(unknown)?.to_string())),
            ("link", "remove") => ToolbarAction::ToggleLink(None),
            ("history", "undo") | ("editor", "undo") => ToolbarAction::Undo,
            ("history", "redo") | ("editor", "redo") => ToolbarAction::Redo,
            _ => return Err(unknown()),
        };
        Ok(action)
    }
}

/// Where the dispatcher is within one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPhase {
    #[default]
    Idle,
    ActionInvoked,
    TreeMutated,
    UIStateRecomputed,
}

impl Session {
    /// Runs one toolbar action to completion.
    ///
    /// Returns true if the document changed.
    pub fn dispatch(&mut self, action: &ToolbarAction) -> CoreResult<bool> {
        self.enter_phase(DispatchPhase::ActionInvoked);
        tracing::debug!(action = %action.display_name(), "dispatching");

        let result = match action {
            ToolbarAction::ToggleFormat(flag) => self.toggle_inline_format(*flag),
            ToolbarAction::SetBlockType(block) => self.set_block_type(*block),
            ToolbarAction::SetStyleProperty { property, value } => {
                self.set_text_style_property(*property, value.as_deref())
            }
            ToolbarAction::Indent(direction) => self.indent(*direction),
            ToolbarAction::InsertEmoji(emoji) => self.insert_emoji(emoji),
            ToolbarAction::InsertText(text) => self.insert_text(text),
            ToolbarAction::ClearFormatting => self.clear_formatting(),
            ToolbarAction::ToggleLink(href) => self.toggle_link(href.as_deref()),
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Redo => self.redo(),
        };

        self.enter_phase(DispatchPhase::Idle);
        result
    }

    /// Runs several actions as one undo step.
    pub fn dispatch_group(&mut self, actions: &[ToolbarAction]) -> CoreResult<bool> {
        self.begin_group();
        let mut changed = false;
        let mut outcome = Ok(());
        for action in actions {
            match self.dispatch(action) {
                Ok(c) => changed |= c,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.end_group();
        outcome.map(|_| changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(ToolbarAction::ToggleFormat(FormatFlag::Bold).display_name(), "Toggle bold");
        assert_eq!(ToolbarAction::Undo.display_name(), "Undo");
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            ToolbarAction::parse("format.bold").unwrap(),
            ToolbarAction::ToggleFormat(FormatFlag::Bold)
        );
        assert_eq!(
            ToolbarAction::parse("style.font-size=15px").unwrap(),
            ToolbarAction::SetStyleProperty {
                property: StyleProperty::FontSize,
                value: Some("15px".to_string())
            }
        );
        assert_eq!(
            ToolbarAction::parse("style.color=").unwrap(),
            ToolbarAction::SetStyleProperty {
                property: StyleProperty::Color,
                value: None
            }
        );
        assert_eq!(
            ToolbarAction::parse("block.ul").unwrap(),
            ToolbarAction::SetBlockType(BlockType::BulletList)
        );
        assert!(matches!(
            ToolbarAction::parse("format.blink"),
            Err(CoreError::UnknownAction(_))
        ));
        assert!(ToolbarAction::parse("nonsense").is_err());
    }
}
