// Client display settings
//
// The old front-end kept the theme in an ambient localStorage key that any
// script could flip. Here it is an explicit settings value with load/save
// hooks; nothing mutates it except through this struct.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Per-client settings. `theme` is `None` until the user picks one, in which
/// case the display follows the system preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl ClientSettings {
    /// Load settings from a JSON file; a missing file is just defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;

        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write settings file {:?}", path))?;

        Ok(())
    }

    /// Saved preference wins; otherwise follow the system preference.
    pub fn effective_theme(&self, system_prefers_dark: bool) -> Theme {
        match self.theme {
            Some(theme) => theme,
            None if system_prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }

    /// Flip the effective theme and record it as an explicit preference,
    /// like the original toggle button did.
    pub fn toggle_theme(&mut self, system_prefers_dark: bool) -> Theme {
        let next = match self.effective_theme(system_prefers_dark) {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
        self.theme = Some(next);
        next
    }
}
