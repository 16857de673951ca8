// Configuration loading

use std::fmt;
use std::path::PathBuf;

pub mod session;
pub mod settings;

pub use session::Session;
pub use settings::Settings;

/// Environment variable that relocates every config file.
pub const HOME_ENV: &str = "PRICELAB_HOME";

/// Directory holding settings, session and the default store.
pub fn config_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pricelab")
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {}", path.display(), message),
            Self::Parse { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            Self::Serialize(msg) => write!(f, "failed to serialize: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
