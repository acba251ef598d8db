//! Editor, backend and upload settings, read from `config.toml`.
//!
//! ## Learning: Partial Config Files
//!
//! `#[serde(default)]` on every section means a config file only needs the
//! keys a user actually changes; everything else falls back to
//! `Default::default()`, and older files keep loading as sections grow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing behaviour
    pub editor: EditorConfig,

    /// Backend connection
    pub api: ApiConfig,

    /// Image upload limits
    pub upload: UploadConfig,

    /// Keyboard settings
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scribe").join("config.toml"))
    }

    /// Writes the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }
}

/// Editing behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history limit
    pub undo_limit: usize,

    /// Typing within this window (ms) is one undo step
    pub coalesce_ms: u64,

    /// Font family shown when a run sets none
    pub default_font_family: String,

    /// Font size (px) shown when a run sets none
    pub default_font_size_px: u32,

    /// Families offered in the font selector
    pub font_families: Vec<String>,

    /// Sizes (px) offered in the size selector
    pub font_sizes: Vec<u32>,
}

impl EditorConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_limit: 1000,
            coalesce_ms: 300,
            default_font_family: "Arial".to_string(),
            default_font_size_px: 15,
            font_families: vec![
                "Arial".to_string(),
                "Georgia".to_string(),
                "Impact".to_string(),
                "Tahoma".to_string(),
                "Times New Roman".to_string(),
                "Verdana".to_string(),
            ],
            font_sizes: vec![8, 9, 10, 11, 12, 14, 15, 16, 18, 24, 30, 36, 48, 60, 72, 96],
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Bearer token; `SCRIBE_TOKEN` overrides it
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

/// Image upload settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// MIME prefix a file must carry to be accepted
    pub accepted_mime_prefix: String,

    /// Max file size to accept (MB)
    pub max_file_size_mb: u64,
}

impl UploadConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_mime_prefix: "image/".to_string(),
            max_file_size_mb: 10,
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Custom key bindings: `"ctrl+e" = "block.code"`
    pub bindings: HashMap<String, String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.undo_limit, 1000);
        assert_eq!(config.editor.coalesce_window(), Duration::from_millis(300));
        assert_eq!(config.upload.accepted_mime_prefix, "image/");
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [editor]
            undo_limit = 50

            [keyboard.bindings]
            "ctrl+e" = "block.code"
            "#,
        )
        .unwrap();
        assert_eq!(config.editor.undo_limit, 50);
        assert_eq!(config.editor.coalesce_ms, 300);
        assert_eq!(config.keyboard.bindings["ctrl+e"], "block.code");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.base_url = "https://blog.example.com/api".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
