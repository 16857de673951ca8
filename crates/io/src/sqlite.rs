// Worksheet store on a single SQLite file

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

use pricelab_engine::model::{coerce_order, Row, Table};
use pricelab_engine::value::{parse_number, CellValue};

use crate::store::{StorageError, WorksheetStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS worksheets (
    name TEXT PRIMARY KEY,
    updated_at TEXT NOT NULL,
    row_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rows (
    worksheet TEXT NOT NULL,
    position INTEGER NOT NULL,
    ord INTEGER,
    reverse INTEGER,             -- 0/1
    label TEXT,
    spec TEXT,
    cost REAL,
    target_margin_percent REAL,
    margin_percent REAL,
    target_gap_amount REAL,
    margin_amount REAL,
    fee_percent REAL,
    fee_amount REAL,
    selling_price REAL,
    PRIMARY KEY (worksheet, position)
);

CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at TEXT NOT NULL,
    role TEXT NOT NULL,
    counterparty TEXT NOT NULL,
    action TEXT NOT NULL,
    snapshot TEXT NOT NULL
);
"#;

const ROW_COLUMNS: &str = "ord, reverse, label, spec, cost, target_margin_percent, margin_percent, \
     target_gap_amount, margin_amount, fee_percent, fee_amount, selling_price";

pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Names of every stored worksheet, sorted.
    pub fn worksheets(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT name FROM worksheets ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl WorksheetStore for SqliteStore {
    fn read(&self, worksheet: &str) -> Result<Table, StorageError> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT row_count FROM worksheets WHERE name = ?1",
                params![worksheet],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::NotFound(worksheet.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM rows WHERE worksheet = ?1 ORDER BY position"
        ))?;
        let rows = stmt
            .query_map(params![worksheet], |r| {
                let mut values = Vec::with_capacity(12);
                for i in 0..12 {
                    values.push(r.get::<_, Value>(i)?);
                }
                Ok(values)
            })?
            .map(|values| values.map(|v| row_from_values(&v)))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("read worksheet '{worksheet}': {} rows", rows.len());
        Ok(Table::new(rows))
    }

    fn write(&mut self, worksheet: &str, table: &Table) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM rows WHERE worksheet = ?1", params![worksheet])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO rows (worksheet, position, {ROW_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ))?;
            for (position, row) in table.iter().enumerate() {
                stmt.execute(params![
                    worksheet,
                    position as i64,
                    row.order as i64,
                    row.reverse as i32,
                    row.label,
                    row.spec,
                    row.cost,
                    row.target_margin_percent,
                    row.margin_percent,
                    row.target_gap_amount,
                    row.margin_amount,
                    row.fee_percent,
                    row.fee_amount,
                    row.selling_price,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO worksheets (name, updated_at, row_count) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at, row_count = excluded.row_count",
            params![worksheet, chrono::Utc::now().to_rfc3339(), table.len() as i64],
        )?;
        tx.commit()?;

        log::info!("wrote worksheet '{worksheet}': {} rows", table.len());
        Ok(())
    }
}

/// SQLite is dynamically typed; anything unexpected in a numeric column reads as 0.
fn number(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Real(r) if r.is_finite() => *r,
        Value::Text(s) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => pricelab_engine::value::format_number(*r),
        _ => String::new(),
    }
}

fn row_from_values(v: &[Value]) -> Row {
    let order = match &v[0] {
        Value::Integer(i) => coerce_order(&CellValue::Number(*i as f64)).unwrap_or(0),
        other => coerce_order(&CellValue::Number(number(other))).unwrap_or(0),
    };
    Row {
        order,
        reverse: number(&v[1]) != 0.0,
        label: text(&v[2]),
        spec: text(&v[3]),
        cost: number(&v[4]),
        target_margin_percent: number(&v[5]),
        margin_percent: number(&v[6]),
        target_gap_amount: number(&v[7]),
        margin_amount: number(&v[8]),
        fee_percent: number(&v[9]),
        fee_amount: number(&v[10]),
        selling_price: number(&v[11]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelab_engine::model::CalcMode;
    use pricelab_engine::reconcile::recompute;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pricelab.db");
        let table = recompute(&Table::sample(), CalcMode::PriceBased);

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.write("CurrentWork", &table).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.read("CurrentWork").unwrap(), table);
        assert_eq!(store.worksheets().unwrap(), vec!["CurrentWork".to_string()]);
    }

    #[test]
    fn missing_worksheet_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(
            store.read("For_Vendor_B"),
            Err(StorageError::NotFound("For_Vendor_B".into()))
        );
    }

    #[test]
    fn rewrite_replaces_previous_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.write("CurrentWork", &Table::sample()).unwrap();
        let one = Table::new(vec![Row::new(1, "only", "", 10.0)]);
        store.write("CurrentWork", &one).unwrap();
        assert_eq!(store.read("CurrentWork").unwrap(), one);
    }

    #[test]
    fn empty_worksheet_is_found_and_empty() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.write("CurrentWork", &Table::default()).unwrap();
        assert!(store.read("CurrentWork").unwrap().is_empty());
    }

    #[test]
    fn null_and_text_cells_coerce_to_numbers() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.write("CurrentWork", &Table::default()).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO rows (worksheet, position, ord, reverse, label, cost, fee_percent) \
                 VALUES ('CurrentWork', 0, 1, NULL, 'x', 'abc', '13')",
                [],
            )
            .unwrap();
        let table = store.read("CurrentWork").unwrap();
        assert_eq!(table.rows[0].cost, 0.0);
        assert_eq!(table.rows[0].fee_percent, 13.0);
        assert!(!table.rows[0].reverse);
        assert_eq!(table.rows[0].spec, "");
    }
}
