use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pricelab_engine::session::PricingSession;

use crate::config_dir;

pub const SESSION_VERSION: u32 = 1;

/// CLI state carried between invocations: the working table and its mode/role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub pricing: PricingSession,
}

impl Session {
    pub fn new(pricing: PricingSession) -> Self {
        Self {
            version: SESSION_VERSION,
            pricing,
        }
    }

    pub fn path() -> PathBuf {
        config_dir().join("session.json")
    }

    pub fn load() -> Option<Self> {
        Self::load_from(&Self::path())
    }

    /// Unreadable or malformed session files are treated as absent.
    pub fn load_from(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("ignoring session file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }
}
