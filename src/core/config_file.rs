//! User configuration file handling
//!
//! Manages settings from ~/.config/hangeul-merge/settings.json

use crate::merge::ranges::SelectionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User configuration from ~/.config/hangeul-merge/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    /// Family name used when --name is not given
    pub default_font_name: Option<String>,
    /// Where merged fonts are written
    pub output_dir: Option<PathBuf>,
    /// Hangul width in Latin cells
    pub width_ratio: Option<f64>,
    /// Default category selection, e.g. `{"koreanHangul": true, ...}`
    pub options: Option<SelectionOptions>,
    pub fast_icon_scan: Option<bool>,
    pub min_output_bytes: Option<usize>,
}

impl ConfigFile {
    /// Get the path to the hangeul-merge config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("hangeul-merge")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Get the path to the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Settings written by --new-config
    pub fn example() -> Self {
        Self {
            default_font_name: None,
            output_dir: None,
            width_ratio: Some(crate::merge::width::DEFAULT_WIDTH_RATIO),
            options: Some(SelectionOptions::recommended()),
            fast_icon_scan: Some(false),
            min_output_bytes: None,
        }
    }

    /// Initialize the complete user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/hangeul-merge directory structure
    /// 2. A settings.json file with default values
    /// 3. A logs/ directory, which turns on file logging
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();

        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = Self::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            Self::example().save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ranges::Category;

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = ConfigFile {
            default_font_name: Some("Hack Hangul".to_string()),
            ..ConfigFile::example()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn partial_settings_parse() {
        let config: ConfigFile = serde_json::from_str(
            r#"{"width_ratio": 1.5, "options": {"koreanHangul": true, "englishIcons": true}}"#,
        )
        .unwrap();
        assert_eq!(config.width_ratio, Some(1.5));
        assert_eq!(
            config.options,
            Some(SelectionOptions::from_categories([
                Category::KoreanHangul,
                Category::EnglishIcons
            ]))
        );
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn broken_settings_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
        assert_eq!(ConfigFile::load_from(&dir.path().join("missing.json")), None);
    }
}
