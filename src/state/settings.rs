/// Application settings
///
/// Created once at startup and handed to whoever needs them. The only
/// mutation entry point is `toggle_theme`, which also writes the file back.
/// The API key is deliberately not part of the file; it comes from the
/// environment so it never lands on disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default image-capable Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Default Generative Language API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine the user config directory")]
    NoConfigDir,
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn toggled(self) -> Self {
        match self {
            ThemeChoice::Dark => ThemeChoice::Light,
            ThemeChoice::Light => ThemeChoice::Dark,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub theme: ThemeChoice,
    /// Model name used for `generateContent`
    pub model: String,
    /// API base URL (no trailing slash)
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeChoice::Dark,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Settings {
    /// Path of the settings file
    /// - Linux: ~/.config/cosplay-studio/settings.json
    /// - macOS: ~/Library/Application Support/cosplay-studio/settings.json
    /// - Windows: %APPDATA%\cosplay-studio\settings.json
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let mut path = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        path.push("cosplay-studio");
        path.push("settings.json");
        Ok(path)
    }

    /// Load settings from the default path, falling back to defaults when
    /// the file is missing or unreadable
    pub fn load_or_default() -> Self {
        let loaded = Self::default_path().and_then(|path| Self::load(&path));
        match loaded {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!("⚠️  Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flip between dark and light and persist the choice
    pub fn toggle_theme(&mut self) -> Result<(), SettingsError> {
        self.theme = self.theme.toggled();
        self.save(&Self::default_path()?)
    }

    /// API key from `GEMINI_API_KEY`, falling back to `API_KEY`
    pub fn api_key() -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
