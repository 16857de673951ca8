//! Append-only history log of table snapshots.
//!
//! Lives next to the worksheets in the same SQLite file. Entries are written
//! on save/send/receive and read back for display only.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use pricelab_engine::model::Table;
use pricelab_engine::session::Role;

use crate::sqlite::SqliteStore;
use crate::store::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Save,
    Send,
    Receive,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::Send => write!(f, "send"),
            Self::Receive => write!(f, "receive"),
        }
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(Self::Save),
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            other => Err(format!("unknown history action: {other}")),
        }
    }
}

/// Listing view of one entry, without the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub id: i64,
    pub recorded_at: String,
    pub role: Role,
    pub counterparty: Role,
    pub action: HistoryAction,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub summary: HistorySummary,
    pub table: Table,
}

/// Local wall-clock timestamp in the log's format.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl SqliteStore {
    /// Record a snapshot. Returns the new entry id.
    pub fn append_history(
        &mut self,
        role: Role,
        action: HistoryAction,
        table: &Table,
    ) -> Result<i64, StorageError> {
        let snapshot =
            serde_json::to_string(table).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO history (recorded_at, role, counterparty, action, snapshot) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                timestamp_now(),
                role.to_string(),
                role.counterparty().to_string(),
                action.to_string(),
                snapshot,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log::info!("history #{id}: {action} by {role} ({} rows)", table.len());
        Ok(id)
    }

    /// Most recent entries first.
    pub fn list_history(&self, limit: usize) -> Result<Vec<HistorySummary>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recorded_at, role, counterparty, action, snapshot \
             FROM history ORDER BY id DESC LIMIT ?1",
        )?;
        let raw = stmt
            .query_map(params![limit as i64], raw_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|r| r.into_entry().map(|e| e.summary))
            .collect()
    }

    pub fn history_entry(&self, id: i64) -> Result<Option<HistoryEntry>, StorageError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, recorded_at, role, counterparty, action, snapshot \
                 FROM history WHERE id = ?1",
                params![id],
                raw_entry,
            )
            .optional()?;
        raw.map(RawEntry::into_entry).transpose()
    }
}

struct RawEntry {
    id: i64,
    recorded_at: String,
    role: String,
    counterparty: String,
    action: String,
    snapshot: String,
}

fn raw_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        recorded_at: row.get(1)?,
        role: row.get(2)?,
        counterparty: row.get(3)?,
        action: row.get(4)?,
        snapshot: row.get(5)?,
    })
}

impl RawEntry {
    fn into_entry(self) -> Result<HistoryEntry, StorageError> {
        let id = self.id;
        let corrupt =
            |what: &str, e: String| StorageError::Corrupt(format!("history #{id}: {what}: {e}"));
        let role = self.role.parse::<Role>().map_err(|e| corrupt("role", e))?;
        let counterparty = self
            .counterparty
            .parse::<Role>()
            .map_err(|e| corrupt("counterparty", e))?;
        let action = self
            .action
            .parse::<HistoryAction>()
            .map_err(|e| corrupt("action", e))?;
        let table: Table =
            serde_json::from_str(&self.snapshot).map_err(|e| corrupt("snapshot", e.to_string()))?;
        Ok(HistoryEntry {
            summary: HistorySummary {
                id,
                recorded_at: self.recorded_at,
                role,
                counterparty,
                action,
                rows: table.len(),
            },
            table,
        })
    }
}
