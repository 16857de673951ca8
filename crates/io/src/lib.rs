// File I/O operations: worksheet storage, history log, CSV/XLSX/JSON exchange

pub mod csv;
pub mod history;
pub mod json;
pub mod sqlite;
pub mod store;
pub mod xlsx;

pub use history::{HistoryAction, HistoryEntry, HistorySummary};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, StorageError, WorksheetStore};
