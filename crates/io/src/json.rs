// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use pricelab_engine::model::Table;

/// Export the table as a pretty-printed array of row objects.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, table).map_err(|e| e.to_string())?;
    Ok(())
}

/// Read a table written by [`export`]. Missing or malformed cells take field defaults.
pub fn import(path: &Path) -> Result<Table, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelab_engine::model::CalcMode;
    use pricelab_engine::reconcile::recompute;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.json");
        let table = recompute(&Table::sample(), CalcMode::CostBased);

        export(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["label"], "Organic carrot");
        assert_eq!(rows[0]["selling_price"], 1150.0);
        assert_eq!(import(&path).unwrap(), table);
    }

    #[test]
    fn test_json_import_is_lenient() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loose.json");
        fs::write(&path, r#"[{"label": "x", "cost": "1,200", "reverse": "maybe"}]"#).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.rows[0].cost, 1200.0);
        assert!(!table.rows[0].reverse);
        assert_eq!(table.rows[0].fee_percent, 0.0);
    }
}
