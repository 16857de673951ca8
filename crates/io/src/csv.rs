// CSV import/export of pricing tables

use std::io::Read;
use std::path::Path;

use pricelab_engine::model::{Field, Row, Table};
use pricelab_engine::value::{format_number, CellValue};

/// Header row, one column per field in grid order.
pub fn header() -> Vec<&'static str> {
    Field::ALL.iter().map(|f| f.name()).collect()
}

pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;
    write_table(table, writer)
}

pub fn export_to_string(table: &Table) -> Result<String, String> {
    let mut buf = Vec::new();
    write_table(table, csv::WriterBuilder::new().from_writer(&mut buf))?;
    String::from_utf8(buf).map_err(|e| e.to_string())
}

fn write_table<W: std::io::Write>(table: &Table, mut writer: csv::Writer<W>) -> Result<(), String> {
    writer.write_record(header()).map_err(|e| e.to_string())?;
    for row in table {
        let record: Vec<String> = Field::ALL
            .iter()
            .map(|f| match row.get(*f) {
                CellValue::Number(n) => format_number(n),
                other => other.to_text(),
            })
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

/// Import a table. The header row maps columns to fields by name; unknown
/// columns are ignored and malformed cells take the field default.
///
/// Derived columns are read as-is; callers run the result through the reducer's
/// finalization to renumber and recompute.
pub fn import(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content)
}

pub fn import_from_string(content: &str) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: Vec<Option<Field>> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| {
            let field = h.parse::<Field>().ok();
            if field.is_none() {
                log::warn!("ignoring unknown CSV column '{h}'");
            }
            field
        })
        .collect();

    if !columns.iter().any(Option::is_some) {
        return Err("CSV header has no recognizable pricing columns".to_string());
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        let mut row = Row::blank((idx + 1) as u32);
        for (col, raw) in record.iter().enumerate() {
            let Some(Some(field)) = columns.get(col) else {
                continue;
            };
            let value = if raw.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(raw.to_string())
            };
            set_imported(&mut row, *field, &value);
        }
        rows.push(row);
    }
    Ok(Table::new(rows))
}

fn set_imported(row: &mut Row, field: Field, value: &CellValue) {
    match field {
        Field::FeeAmount => row.fee_amount = value.number_or_zero(),
        Field::MarginAmount => row.margin_amount = value.number_or_zero(),
        Field::TargetGapAmount => row.target_gap_amount = value.number_or_zero(),
        Field::Order if value.is_empty() => {}
        other => {
            row.set_verbatim(other, value);
        }
    }
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for Excel-saved CSVs)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelab_engine::model::CalcMode;
    use pricelab_engine::reconcile::recompute;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn export_writes_header_and_rows() {
        let table = recompute(&Table::sample(), CalcMode::PriceBased);
        let out = export_to_string(&table).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), header().join(","));
        assert_eq!(
            lines.next().unwrap(),
            "1,false,Organic carrot,1kg,1000,20,15,-59,176,0,0,1176"
        );
    }

    #[test]
    fn import_reads_exported_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let table = recompute(&Table::sample(), CalcMode::PriceBased);
        export(&table, &path).unwrap();

        assert_eq!(import(&path).unwrap(), table);
    }

    #[test]
    fn import_coerces_bad_cells_and_ignores_unknown_columns() {
        let csv = "\
label,cost,fee_percent,reverse,notes
carrot,\"1,000\",13,yes,organic
onion,n/a,,0,
";
        let table = import_from_string(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].cost, 1000.0);
        assert_eq!(table.rows[0].fee_percent, 13.0);
        assert!(table.rows[0].reverse);
        assert_eq!(table.rows[0].order, 1);
        assert_eq!(table.rows[1].cost, 0.0);
        assert_eq!(table.rows[1].order, 2);
        assert!(!table.rows[1].reverse);
    }

    #[test]
    fn import_rejects_foreign_header() {
        assert!(import_from_string("a,b\n1,2\n").is_err());
    }

    #[test]
    fn import_decodes_windows_1252() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Crème" in Windows-1252
        fs::write(&path, b"label,cost\nCr\xe8me,5\n").unwrap();
        let table = import(&path).unwrap();
        assert_eq!(table.rows[0].label, "Crème");
    }
}
