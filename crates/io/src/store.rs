//! Worksheet storage: whole-table reads and writes.
//!
//! Every backend replaces a worksheet atomically; there is no row-level API.

use std::collections::HashMap;
use std::fmt;

use pricelab_engine::model::Table;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The worksheet has never been written.
    NotFound(String),
    /// The backend could not be reached or refused the operation.
    Unavailable(String),
    /// Stored data could not be turned back into a table.
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(ws) => write!(f, "worksheet '{ws}' not found"),
            Self::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Self::Corrupt(msg) => write!(f, "stored data is corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// A spreadsheet-like backend addressed by worksheet name.
pub trait WorksheetStore {
    fn read(&self, worksheet: &str) -> Result<Table, StorageError>;
    fn write(&mut self, worksheet: &str, table: &Table) -> Result<(), StorageError>;
}

/// In-process store. Backs tests and local-only sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: HashMap<String, Table>,
    offline: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call with `reason`, for exercising degraded paths.
    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            sheets: HashMap::new(),
            offline: Some(reason.into()),
        }
    }

    pub fn worksheets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sheets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl WorksheetStore for MemoryStore {
    fn read(&self, worksheet: &str) -> Result<Table, StorageError> {
        if let Some(reason) = &self.offline {
            return Err(StorageError::Unavailable(reason.clone()));
        }
        self.sheets
            .get(worksheet)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(worksheet.to_string()))
    }

    fn write(&mut self, worksheet: &str, table: &Table) -> Result<(), StorageError> {
        if let Some(reason) = &self.offline {
            return Err(StorageError::Unavailable(reason.clone()));
        }
        self.sheets.insert(worksheet.to_string(), table.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip_replaces_whole_sheet() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.read("CurrentWork"),
            Err(StorageError::NotFound("CurrentWork".into()))
        );

        store.write("CurrentWork", &Table::sample()).unwrap();
        store.write("CurrentWork", &Table::default()).unwrap();
        assert!(store.read("CurrentWork").unwrap().is_empty());
        assert_eq!(store.worksheets(), vec!["CurrentWork"]);
    }

    #[test]
    fn offline_store_fails_recoverably() {
        let mut store = MemoryStore::offline("no network");
        assert!(matches!(store.read("x"), Err(StorageError::Unavailable(_))));
        assert!(matches!(store.write("x", &Table::sample()), Err(StorageError::Unavailable(_))));
    }
}
