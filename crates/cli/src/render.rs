// Plain-text rendering for terminal output

use pricelab_engine::model::{Field, Table};
use pricelab_engine::reducer::EditReport;
use pricelab_engine::summary::TableSummary;
use pricelab_engine::value::{format_number, CellValue};

fn column_title(field: Field) -> &'static str {
    match field {
        Field::Order => "#",
        Field::Reverse => "rev",
        Field::Label => "label",
        Field::Spec => "spec",
        Field::Cost => "cost",
        Field::TargetMarginPercent => "target%",
        Field::MarginPercent => "margin%",
        Field::TargetGapAmount => "gap",
        Field::MarginAmount => "margin",
        Field::FeePercent => "fee%",
        Field::FeeAmount => "fee",
        Field::SellingPrice => "price",
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Bool(true) => "R".to_string(),
        CellValue::Bool(false) => String::new(),
        CellValue::Number(n) => format_number(*n),
        other => other.to_text(),
    }
}

/// Aligned grid: text columns left-aligned, numbers right-aligned.
pub fn table(table: &Table) -> String {
    let header: Vec<String> = Field::ALL.iter().map(|f| column_title(*f).to_string()).collect();
    let body: Vec<Vec<String>> = table
        .iter()
        .map(|row| Field::ALL.iter().map(|f| cell_text(&row.get(*f))).collect())
        .collect();

    let widths: Vec<usize> = (0..Field::ALL.len())
        .map(|col| {
            body.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(header[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in std::iter::once(&header).chain(body.iter()) {
        let cells: Vec<String> = line
            .iter()
            .zip(Field::ALL.iter())
            .zip(widths.iter())
            .map(|((text, field), width)| match field {
                Field::Label | Field::Spec => format!("{:<width$}", text, width = *width),
                _ => format!("{:>width$}", text, width = *width),
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn summary(summary: &TableSummary) -> String {
    let avg = summary
        .average_realized_margin_percent
        .map(|p| format!("{}%", format_number(p)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} rows ({} reverse), cost {}, price {}, fee {}, margin {}, avg margin {}, {} below target",
        summary.rows,
        summary.reverse_rows,
        format_number(summary.total_cost),
        format_number(summary.total_selling_price),
        format_number(summary.total_fee_amount),
        format_number(summary.total_margin_amount),
        avg,
        summary.rows_below_target,
    )
}

/// One line for the change-set, plus one per rejected edit.
pub fn edit_report(report: &EditReport) -> Vec<String> {
    let mut lines = vec![format!(
        "applied {} edit{}, appended {} row{}",
        report.applied,
        if report.applied == 1 { "" } else { "s" },
        report.appended,
        if report.appended == 1 { "" } else { "s" },
    )];
    for rejected in &report.rejected {
        lines.push(format!(
            "rejected row {} {}: {}",
            rejected.edit.row + 1,
            rejected.edit.field,
            rejected.rejection
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelab_engine::model::CalcMode;
    use pricelab_engine::reconcile::recompute;
    use pricelab_engine::summary::summarize;

    #[test]
    fn table_aligns_columns() {
        let t = recompute(&Table::sample(), CalcMode::PriceBased);
        let text = table(&t);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#  rev  label"));
        assert!(lines[1].contains("Organic carrot"));
        assert!(lines[1].ends_with("1176"));
        assert!(lines[2].ends_with("2353"));
    }

    #[test]
    fn summary_line_mentions_totals() {
        let t = recompute(&Table::sample(), CalcMode::PriceBased);
        let line = summary(&summarize(&t));
        assert!(line.starts_with("2 rows (0 reverse), cost 3000"));
        assert!(line.ends_with("2 below target"));
    }

    #[test]
    fn empty_summary_has_no_average() {
        let line = summary(&summarize(&Table::default()));
        assert!(line.contains("avg margin -"));
    }
}
