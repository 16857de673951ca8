//! Reconciliation engine: derive every row's dependent fields from its
//! authoritative ones.
//!
//! A normal row solves for selling price from cost; a reverse row solves for
//! cost from selling price. Fee amount, margin amount and target gap are then
//! derived from the resolved pair. The pass is pure, total and idempotent.

use crate::error::RowComputeError;
use crate::model::{CalcMode, Field, Row, Table};

/// Outcome of a recompute pass.
#[derive(Debug, Clone, Default)]
pub struct RecomputeReport {
    pub rows_recomputed: usize,
    /// Rows left untouched, by table position.
    pub skipped: Vec<(usize, RowComputeError)>,
}

/// Recompute every row under `mode`.
pub fn recompute(table: &Table, mode: CalcMode) -> Table {
    recompute_with_report(table, mode).0
}

/// Recompute every row under `mode`, reporting rows that had to be skipped.
///
/// A failing row keeps all of its previous values; the rest of the table is
/// still recomputed.
pub fn recompute_with_report(table: &Table, mode: CalcMode) -> (Table, RecomputeReport) {
    let mut report = RecomputeReport::default();
    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| match compute_row(row, mode) {
            Ok(computed) => {
                report.rows_recomputed += 1;
                computed
            }
            Err(err) => {
                log::warn!("row {} ('{}') skipped during recompute: {}", idx + 1, row.label, err);
                report.skipped.push((idx, err));
                row.clone()
            }
        })
        .collect();
    log::debug!(
        "recompute ({mode}): {} rows, {} skipped",
        report.rows_recomputed,
        report.skipped.len()
    );
    (Table::new(rows), report)
}

/// Resolve one row. Returns a new row; the input is never modified.
pub fn compute_row(row: &Row, mode: CalcMode) -> Result<Row, RowComputeError> {
    check_finite(row)?;

    let fee = row.fee_percent / 100.0;
    let margin = row.margin_percent / 100.0;
    let target = row.target_margin_percent / 100.0;

    let mut out = row.clone();

    if row.reverse {
        out.cost = round_unit(cost_from_price(row.selling_price, fee, margin, mode)?);
    } else {
        out.selling_price = round_unit(price_from_cost(row.cost, fee, margin, mode));
    }

    let price = out.selling_price;
    let cost = out.cost;
    let fee_amount = price * fee;
    let margin_amount = price - cost - fee_amount;
    let target_base = match mode {
        CalcMode::PriceBased => price,
        CalcMode::CostBased => cost,
    };

    out.fee_amount = round_unit(fee_amount);
    out.margin_amount = round_unit(margin_amount);
    out.target_gap_amount = round_unit(margin_amount - target_base * target);

    for (field, value) in [
        (Field::Cost, out.cost),
        (Field::SellingPrice, out.selling_price),
        (Field::FeeAmount, out.fee_amount),
        (Field::MarginAmount, out.margin_amount),
        (Field::TargetGapAmount, out.target_gap_amount),
    ] {
        if !value.is_finite() {
            return Err(RowComputeError::NonFinite { field, value });
        }
    }

    Ok(out)
}

/// Forward formula. Infeasible fee/margin combinations saturate to a price of 0.
pub fn price_from_cost(cost: f64, fee: f64, margin: f64, mode: CalcMode) -> f64 {
    match mode {
        CalcMode::PriceBased => {
            let denom = 1.0 - margin - fee;
            if denom > 0.0 {
                cost / denom
            } else {
                0.0
            }
        }
        CalcMode::CostBased => {
            let denom = 1.0 - fee;
            if denom > 0.0 {
                cost * (1.0 + margin) / denom
            } else {
                0.0
            }
        }
    }
}

/// Inverse formula used by reverse rows.
pub fn cost_from_price(
    price: f64,
    fee: f64,
    margin: f64,
    mode: CalcMode,
) -> Result<f64, RowComputeError> {
    match mode {
        CalcMode::PriceBased => Ok(price * (1.0 - margin - fee)),
        CalcMode::CostBased => {
            let denom = 1.0 + margin;
            if denom == 0.0 {
                return Err(RowComputeError::DivisionByZero {
                    formula: "price * (1 - fee) / (1 + margin)",
                });
            }
            Ok(price * (1.0 - fee) / denom)
        }
    }
}

/// Margin implied by an edited selling price, as a fraction. 0 when undefined.
pub fn margin_from_price(price: f64, cost: f64, fee: f64, mode: CalcMode) -> f64 {
    match mode {
        CalcMode::PriceBased => {
            if price > 0.0 {
                (price - cost - price * fee) / price
            } else {
                0.0
            }
        }
        CalcMode::CostBased => {
            if cost > 0.0 {
                (price * (1.0 - fee) - cost) / cost
            } else {
                0.0
            }
        }
    }
}

/// Round to the nearest whole currency unit, ties to even.
pub fn round_unit(value: f64) -> f64 {
    value.round_ties_even()
}

/// Round a percentage to two decimals, ties to even.
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn check_finite(row: &Row) -> Result<(), RowComputeError> {
    let inputs = [
        (Field::Cost, row.cost),
        (Field::SellingPrice, row.selling_price),
        (Field::FeePercent, row.fee_percent),
        (Field::MarginPercent, row.margin_percent),
        (Field::TargetMarginPercent, row.target_margin_percent),
    ];
    for (field, value) in inputs {
        if !value.is_finite() {
            return Err(RowComputeError::NonFinite { field, value });
        }
    }
    Ok(())
}
