// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview settings, stored as RON.

use crate::schedule::DEFAULT_AUTO_ADVANCE;
use dialogue_graph::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "preview.ron";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Malformed RON
    #[error("Invalid preview settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failure
    #[error("Could not serialize preview settings: {0}")]
    Serialize(#[from] ron::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conversation preview settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Delay before an event node advances on its own, in milliseconds
    pub auto_advance_ms: u64,
    /// Explicit start node. Root discovery is used when unset or unusable.
    pub start_node: Option<NodeId>,
    /// Whether players print the visited set after each step
    pub show_visited: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            auto_advance_ms: DEFAULT_AUTO_ADVANCE.as_millis() as u64,
            start_node: None,
            show_visited: false,
        }
    }
}

impl PreviewSettings {
    /// Auto-advance delay as a duration
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }

    /// Parse settings from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(content)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded preview settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved preview settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PreviewSettings::default();
        assert_eq!(settings.auto_advance_ms, 1000);
        assert_eq!(settings.auto_advance_delay(), Duration::from_secs(1));
        assert!(settings.start_node.is_none());
    }

    #[test]
    fn test_serialization() {
        let settings = PreviewSettings {
            auto_advance_ms: 250,
            start_node: Some("intro".into()),
            show_visited: true,
        };
        let ron_str = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = PreviewSettings::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("dialogue-preview-{}.ron", std::process::id()));
        let settings = PreviewSettings {
            auto_advance_ms: 400,
            start_node: Some("gate".into()),
            show_visited: false,
        };
        settings.save(&path).unwrap();
        let loaded = PreviewSettings::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = PreviewSettings::from_ron_str("(auto_advance_ms: 10)").unwrap();
        assert_eq!(loaded.auto_advance_ms, 10);
        assert!(!loaded.show_visited);
    }
}
