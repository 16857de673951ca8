// Per-invocation state: settings, the persisted session, and store access

use pricelab_config::{Session, Settings};
use pricelab_engine::model::Table;
use pricelab_engine::session::PricingSession;
use pricelab_io::SqliteStore;

use crate::exit_codes::storage_exit_code;
use crate::CliError;

pub struct Workspace {
    pub settings: Settings,
    pub pricing: PricingSession,
}

impl Workspace {
    /// Load settings and the last session. Without a session, start from the sample table.
    pub fn load() -> Self {
        let settings = Settings::load();
        let mut pricing = match Session::load() {
            Some(session) => session.pricing,
            None => Self::fresh_session(&settings),
        };
        // Presets are owned by settings; a stale session copy is replaced.
        pricing.fee_presets = settings.fee_presets.clone();
        Self { settings, pricing }
    }

    pub fn fresh_session(settings: &Settings) -> PricingSession {
        PricingSession::new(
            Table::sample(),
            settings.default_mode,
            settings.role,
            settings.fee_presets.clone(),
        )
    }

    pub fn save(&self) -> Result<(), CliError> {
        Session::new(self.pricing.clone())
            .save()
            .map_err(|e| CliError::io(format!("failed to save session: {e}")))
    }

    pub fn open_store(&self) -> Result<SqliteStore, CliError> {
        let path = self.settings.store_path();
        tracing::debug!("opening store {}", path.display());
        SqliteStore::open(&path).map_err(|e| {
            CliError::new(storage_exit_code(&e), e.to_string())
                .with_hint(format!("store path: {}", path.display()))
        })
    }
}
