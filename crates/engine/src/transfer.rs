//! Cross-workspace price transfer.
//!
//! The counterparty's selling prices become this workspace's costs. Rows are
//! paired by position or by label; reverse rows keep their cost since the
//! engine derives it from their own selling price.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::label::label_key;
use crate::model::{CalcMode, Table};
use crate::reconcile::recompute;

/// How rows of the two tables are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferJoin {
    /// Row i takes the price of counterpart row i.
    #[default]
    Position,
    /// Rows take the price of the counterpart row with the same label
    /// (reverse tag and surrounding whitespace ignored).
    Label,
}

impl fmt::Display for TransferJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Label => write!(f, "label"),
        }
    }
}

impl FromStr for TransferJoin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" | "pos" => Ok(Self::Position),
            "label" => Ok(Self::Label),
            other => Err(format!("unknown join: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferReport {
    pub updated: usize,
    /// Rows with no counterpart (or reverse rows), by table position.
    pub unmatched: Vec<usize>,
}

/// Overwrite costs with the counterpart's selling prices and recompute.
pub fn apply_counterpart_prices(
    table: &Table,
    counterpart: &Table,
    join: TransferJoin,
    mode: CalcMode,
) -> (Table, TransferReport) {
    let mut rows = table.rows.clone();
    let mut report = TransferReport::default();

    let by_label: HashMap<String, f64> = match join {
        TransferJoin::Label => {
            let mut map = HashMap::new();
            // first occurrence wins on duplicate labels
            for row in counterpart {
                map.entry(label_key(&row.label)).or_insert(row.selling_price);
            }
            map
        }
        TransferJoin::Position => HashMap::new(),
    };

    for (idx, row) in rows.iter_mut().enumerate() {
        let price = match join {
            TransferJoin::Position => counterpart.get(idx).map(|r| r.selling_price),
            TransferJoin::Label => by_label.get(&label_key(&row.label)).copied(),
        };
        match price {
            Some(price) if !row.reverse => {
                row.cost = price;
                report.updated += 1;
            }
            _ => report.unmatched.push(idx),
        }
    }

    log::info!(
        "transfer by {join}: {} rows updated, {} unmatched",
        report.updated,
        report.unmatched.len()
    );
    (recompute(&Table::new(rows), mode), report)
}
