//! Settings service
//!
//! Manages the global settings record, persisted as a single JSON file in
//! the profile directory. Per-note overrides live on the notes themselves;
//! lookup precedence is note setting, then global setting, then the
//! hardcoded default.

use crate::config::DEFAULT_FONT_SIZE;
use crate::database::models::TitleSource;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Color scheme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    System,
    Light,
    Dark,
}

/// Global settings applied to every note that carries no override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Default title source for notes without their own setting
    #[serde(default)]
    pub title: TitleSource,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Append hard-break spaces to pasted multi-line text
    #[serde(default = "default_true")]
    pub auto_line_break: bool,
    /// Escape literal `~` in pasted text
    #[serde(default = "default_true")]
    pub tilde_replacement: bool,
    /// Pad lines to two trailing spaces on Enter
    #[serde(default = "default_true")]
    pub auto_add_spaces: bool,
    /// Refuse to soft-delete images still referenced by a note
    #[serde(default = "default_true")]
    pub prevent_used_image_deletion: bool,
    #[serde(default)]
    pub mode: ColorMode,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            title: TitleSource::Default,
            font_size: default_font_size(),
            auto_line_break: true,
            tilde_replacement: true,
            auto_add_spaces: true,
            prevent_used_image_deletion: true,
            mode: ColorMode::System,
        }
    }
}

/// Service for loading and persisting the global settings record
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            settings_path: profile_dir.join("settings.json"),
        }
    }

    /// Load settings from disk, writing the documented defaults on first run
    pub async fn load(&self) -> Result<GlobalSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = GlobalSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: GlobalSettings = serde_json::from_str(&content).map_err(|e| {
            tracing::warn!("Failed to parse settings file: {}", e);
            AppError::Serialization(e)
        })?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &GlobalSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::debug!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}
