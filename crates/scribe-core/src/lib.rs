//! # Scribe Core
//!
//! Editor session and toolbar command dispatch.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Session                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐│
//! │  │   Keymap    │ │   Config    │ │ Toolbar Dispatcher  ││
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘│
//! │         │                                                │
//! │  ┌──────┴──────────────────────────────────┐            │
//! │  │   DocumentTree · Selection · History     │            │
//! │  └─────────────────────────────────────────┘            │
//! │         │ ContentChanged(html) / ToolbarChanged           │
//! │         ▼                                                │
//! │      EventBus ──▶ host (draft state, toolbar widgets)    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Module Organization
//!
//! The editing operations are split by concern (`format`, `blocks`,
//! `lists`) as free functions over a tree and a resolved range. The
//! `Session` wraps them with the bookkeeping every committed mutation
//! needs: history, normalization, selection remapping and notification.

pub mod blocks;
pub mod command;
pub mod config;
pub mod event;
pub mod format;
pub mod keymap;
pub mod lists;
pub mod session;
pub mod toolbar;

pub use command::{DispatchPhase, ToolbarAction};
pub use config::Config;
pub use event::{ContentFeed, EventBus, SessionEvent};
pub use keymap::{Key, KeyPress, Keymap, Modifiers};
pub use lists::IndentDirection;
pub use session::Session;
pub use toolbar::{BlockType, FontOptions, ToolbarState};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document error: {0}")]
    Document(#[from] scribe_doc::DocError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}
