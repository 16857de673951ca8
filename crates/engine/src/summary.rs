use serde::Serialize;

use crate::model::Table;

/// Column totals and a couple of table-level ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub reverse_rows: usize,
    pub total_cost: f64,
    pub total_selling_price: f64,
    pub total_fee_amount: f64,
    pub total_margin_amount: f64,
    pub total_target_gap_amount: f64,
    /// Mean of `margin_amount / selling_price` over rows with a positive price, in percent.
    pub average_realized_margin_percent: Option<f64>,
    /// Rows whose margin falls short of their target.
    pub rows_below_target: usize,
}

pub fn summarize(table: &Table) -> TableSummary {
    let mut summary = TableSummary {
        rows: table.len(),
        ..TableSummary::default()
    };
    let mut realized = Vec::new();

    for row in table {
        if row.reverse {
            summary.reverse_rows += 1;
        }
        summary.total_cost += row.cost;
        summary.total_selling_price += row.selling_price;
        summary.total_fee_amount += row.fee_amount;
        summary.total_margin_amount += row.margin_amount;
        summary.total_target_gap_amount += row.target_gap_amount;
        if row.target_gap_amount < 0.0 {
            summary.rows_below_target += 1;
        }
        if row.selling_price > 0.0 {
            realized.push(row.margin_amount / row.selling_price * 100.0);
        }
    }

    if !realized.is_empty() {
        let mean = realized.iter().sum::<f64>() / realized.len() as f64;
        summary.average_realized_margin_percent = Some(crate::reconcile::round_percent(mean));
    }
    summary
}
