// Excel export of pricing tables

use std::path::Path;
use std::time::Instant;

use rust_xlsxwriter::{Format, FormatAlign, Workbook as XlsxWorkbook, Worksheet};

use pricelab_engine::model::{Field, Table};
use pricelab_engine::value::CellValue;

/// Worksheet name used in exported workbooks.
pub const SHEET_NAME: &str = "Price_Lab";

/// Result of an Excel export operation
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Data rows written (header excluded)
    pub rows_exported: usize,
    /// Total cells exported, header included
    pub cells_exported: usize,
    /// Export duration in milliseconds
    pub export_duration_ms: u128,
}

impl ExportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        format!(
            "{} row{}, {} cells",
            self.rows_exported,
            if self.rows_exported == 1 { "" } else { "s" },
            self.cells_exported
        )
    }
}

/// Default download name for today's export, e.g. `Pricing_0315.xlsx`.
pub fn default_export_name() -> String {
    export_name_for(chrono::Local::now().date_naive())
}

pub fn export_name_for(date: chrono::NaiveDate) -> String {
    format!("Pricing_{}.xlsx", date.format("%m%d"))
}

/// Export the table to a single-sheet workbook with a bold header row.
pub fn export(table: &Table, path: &Path) -> Result<ExportResult, String> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", SHEET_NAME, e))?;

    write_header(worksheet)?;
    result.cells_exported += Field::ALL.len();

    let number_format = Format::new().set_num_format("#,##0.##");
    for (idx, row) in table.iter().enumerate() {
        let row32 = (idx + 1) as u32;
        for (col, field) in Field::ALL.iter().enumerate() {
            let col16 = col as u16;
            match row.get(*field) {
                CellValue::Number(n) => worksheet
                    .write_number_with_format(row32, col16, n, &number_format)
                    .map(|_| ()),
                CellValue::Bool(b) => worksheet.write_boolean(row32, col16, b).map(|_| ()),
                CellValue::Text(s) if s.is_empty() => Ok(()),
                CellValue::Text(s) => worksheet.write_string(row32, col16, &s).map(|_| ()),
                CellValue::Empty => Ok(()),
            }
            .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col16, e))?;
            result.cells_exported += 1;
        }
        result.rows_exported += 1;
    }

    apply_column_widths(worksheet, table)?;

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    log::info!("exported {} to {}", result.summary(), path.display());
    Ok(result)
}

fn write_header(worksheet: &mut Worksheet) -> Result<(), String> {
    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, field) in Field::ALL.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, field.name(), &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }
    Ok(())
}

/// Widen each column to fit its header or longest text value.
fn apply_column_widths(worksheet: &mut Worksheet, table: &Table) -> Result<(), String> {
    for (col, field) in Field::ALL.iter().enumerate() {
        let widest = table
            .iter()
            .map(|row| row.get(*field).to_text().chars().count())
            .max()
            .unwrap_or(0)
            .max(field.name().len());
        worksheet
            .set_column_width(col as u16, (widest + 2) as f64)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use pricelab_engine::model::CalcMode;
    use pricelab_engine::reconcile::recompute;
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_price_lab_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Pricing_0101.xlsx");
        let table = recompute(&Table::sample(), CalcMode::PriceBased);

        let result = export(&table, &path).unwrap();
        assert_eq!(result.rows_exported, 2);
        assert_eq!(result.cells_exported, 36);

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("order".into())));
        assert_eq!(
            range.get_value((0, 11)),
            Some(&Data::String("selling_price".into()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Bool(false)));
        assert_eq!(
            range.get_value((1, 2)),
            Some(&Data::String("Organic carrot".into()))
        );
        assert_eq!(range.get_value((1, 11)), Some(&Data::Float(1176.0)));
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let result = export(&Table::default(), &path).unwrap();
        assert_eq!(result.rows_exported, 0);
        assert_eq!(result.summary(), "0 rows, 12 cells");
        assert!(path.exists());
    }

    #[test]
    fn test_export_name_uses_month_and_day() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(export_name_for(date), "Pricing_0305.xlsx");
    }
}
