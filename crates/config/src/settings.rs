use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pricelab_engine::model::CalcMode;
use pricelab_engine::presets::FeePresets;
use pricelab_engine::session::Role;

use crate::{config_dir, ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fee percentages accepted in the grid. 0 is always included.
    pub fee_presets: FeePresets,

    /// Margin basis used when a new session starts.
    pub default_mode: CalcMode,

    /// Which side of the exchange this workspace is.
    pub role: Role,

    /// SQLite store; defaults to `pricelab.db` in the config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Worksheet holding the working table.
    pub current_worksheet: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fee_presets: FeePresets::default(),
            default_mode: CalcMode::default(),
            role: Role::default(),
            store_path: None,
            current_worksheet: "CurrentWork".to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        config_dir().join("settings.toml")
    }

    /// Resolved store location.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| config_dir().join("pricelab.db"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, text).map_err(io_err)
    }
}
