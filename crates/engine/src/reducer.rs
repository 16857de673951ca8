//! Edit reducer: fold one grid change-set into a new authoritative table.
//!
//! Cell edits are applied in arrival order against the table as it was before
//! the change-set (row indices never shift mid-batch), blank rows are appended,
//! the table is sorted and renumbered, and the reconciliation engine derives
//! everything else.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChangeSetError;
use crate::label::sync_reverse_tag;
use crate::model::{coerce_order, CalcMode, Field, Row, Table};
use crate::ordering;
use crate::presets::FeePresets;
use crate::reconcile::{margin_from_price, recompute, round_percent};
use crate::value::CellValue;

// ---------------------------------------------------------------------------
// Change-set
// ---------------------------------------------------------------------------

/// One edited cell, addressed by table position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellEdit {
    pub row: usize,
    pub field: Field,
    pub value: CellValue,
}

impl CellEdit {
    pub fn new(row: usize, field: Field, value: impl Into<CellValue>) -> Self {
        Self {
            row,
            field,
            value: value.into(),
        }
    }
}

/// Everything the grid reports for one user interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Cell edits in arrival order. Later edits to the same cell win.
    #[serde(default)]
    pub edits: Vec<CellEdit>,
    /// Number of blank rows to append after the edits.
    #[serde(default)]
    pub appended_rows: usize,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(mut self, row: usize, field: Field, value: impl Into<CellValue>) -> Self {
        self.edits.push(CellEdit::new(row, field, value));
        self
    }

    pub fn append_rows(mut self, count: usize) -> Self {
        self.appended_rows += count;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.appended_rows == 0
    }

    /// Parse the grid editor's native payload:
    ///
    /// ```json
    /// {"edited_rows": {"0": {"selling_price": 1000}}, "added_rows": [{}]}
    /// ```
    ///
    /// Unknown column names are dropped with a warning; a malformed shape is an error.
    pub fn from_editor_json(json: &str) -> Result<Self, ChangeSetError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ChangeSetError::Parse(e.to_string()))?;
        Self::from_editor_value(&value)
    }

    pub fn from_editor_value(value: &Value) -> Result<Self, ChangeSetError> {
        let obj = value.as_object().ok_or(ChangeSetError::Shape {
            section: "root",
            expected: "an object",
        })?;

        let mut changes = ChangeSet::new();

        if let Some(edited) = obj.get("edited_rows").or_else(|| obj.get("editedRows")) {
            let edited = edited.as_object().ok_or(ChangeSetError::Shape {
                section: "edited_rows",
                expected: "an object keyed by row index",
            })?;
            for (key, cells) in edited {
                let row: usize = key
                    .trim()
                    .parse()
                    .map_err(|_| ChangeSetError::RowKey(key.clone()))?;
                let cells = cells.as_object().ok_or(ChangeSetError::Shape {
                    section: "edited_rows",
                    expected: "an object of column -> value per row",
                })?;
                for (column, raw) in cells {
                    let field = match column.parse::<Field>() {
                        Ok(field) => field,
                        Err(e) => {
                            log::warn!("dropping edit to row {row}: {e}");
                            continue;
                        }
                    };
                    let value: CellValue = serde_json::from_value(raw.clone()).unwrap_or_default();
                    changes.edits.push(CellEdit { row, field, value });
                }
            }
        }

        if let Some(added) = obj.get("added_rows").or_else(|| obj.get("addedRows")) {
            let added = added.as_array().ok_or(ChangeSetError::Shape {
                section: "added_rows",
                expected: "an array",
            })?;
            changes.appended_rows = added.len();
        }

        Ok(changes)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Why an edit was not applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Rejection {
    RowOutOfRange { rows: usize },
    DerivedField,
    InvalidOrder,
    FeeNotPreset { presets: Vec<f64> },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowOutOfRange { rows } => write!(f, "row index out of range (table has {rows} rows)"),
            Self::DerivedField => write!(f, "field is derived and cannot be edited"),
            Self::InvalidOrder => write!(f, "order must be a number"),
            Self::FeeNotPreset { presets } => {
                let list: Vec<String> = presets.iter().map(|p| crate::value::format_number(*p)).collect();
                write!(f, "fee is not one of the presets [{}]", list.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEdit {
    pub edit: CellEdit,
    pub rejection: Rejection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditReport {
    pub applied: usize,
    pub appended: usize,
    pub rejected: Vec<RejectedEdit>,
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Apply a change-set and recompute under `mode`.
pub fn apply_edit(table: &Table, changes: &ChangeSet, mode: CalcMode) -> Table {
    reduce(table, changes, mode, None).0
}

/// Like [`apply_edit`], but fee edits must hit one of `presets`; the report
/// lists every edit that was dropped.
pub fn apply_edit_checked(
    table: &Table,
    changes: &ChangeSet,
    mode: CalcMode,
    presets: &FeePresets,
) -> (Table, EditReport) {
    reduce(table, changes, mode, Some(presets))
}

/// Sort, renumber and recompute without any edits. Used after grid-level
/// deletions and imports.
pub fn finalize(rows: Vec<Row>, mode: CalcMode) -> Table {
    let mut rows = rows;
    ordering::normalize(&mut rows);
    recompute(&Table::new(rows), mode)
}

fn reduce(
    table: &Table,
    changes: &ChangeSet,
    mode: CalcMode,
    presets: Option<&FeePresets>,
) -> (Table, EditReport) {
    let mut rows = table.rows.clone();
    let mut report = EditReport::default();

    for edit in &changes.edits {
        match apply_cell_edit(&mut rows, edit, mode, presets) {
            Ok(()) => report.applied += 1,
            Err(rejection) => {
                log::warn!(
                    "edit to row {} field '{}' rejected: {}",
                    edit.row,
                    edit.field,
                    rejection
                );
                report.rejected.push(RejectedEdit {
                    edit: edit.clone(),
                    rejection,
                });
            }
        }
    }

    for _ in 0..changes.appended_rows {
        let order = rows.len() as u32 + 1;
        rows.push(Row::blank(order));
        report.appended += 1;
    }

    log::debug!(
        "reduced change-set: {} applied, {} rejected, {} appended",
        report.applied,
        report.rejected.len(),
        report.appended
    );

    (finalize(rows, mode), report)
}

fn apply_cell_edit(
    rows: &mut [Row],
    edit: &CellEdit,
    mode: CalcMode,
    presets: Option<&FeePresets>,
) -> Result<(), Rejection> {
    let len = rows.len();
    if edit.row >= len {
        return Err(Rejection::RowOutOfRange { rows: len });
    }
    if edit.field.is_derived() {
        return Err(Rejection::DerivedField);
    }

    match edit.field {
        Field::Reverse => {
            let row = &mut rows[edit.row];
            let reverse = edit.value.as_bool().unwrap_or(false);
            row.reverse = reverse;
            row.label = sync_reverse_tag(&row.label, reverse);
        }
        Field::Order => {
            let new_order = coerce_order(&edit.value).ok_or(Rejection::InvalidOrder)?;
            ordering::move_row(rows, edit.row, new_order);
        }
        Field::SellingPrice => {
            let row = &mut rows[edit.row];
            let price = edit.value.number_or_zero();
            if !row.reverse {
                let fee = row.fee_percent / 100.0;
                let margin = margin_from_price(price, row.cost, fee, mode);
                row.margin_percent = round_percent(margin * 100.0);
            }
            row.selling_price = price;
        }
        Field::FeePercent => {
            let fee = edit.value.number_or_zero();
            if let Some(presets) = presets {
                if !presets.contains(fee) {
                    return Err(Rejection::FeeNotPreset {
                        presets: presets.values().to_vec(),
                    });
                }
            }
            rows[edit.row].fee_percent = fee;
        }
        field => {
            rows[edit.row].set_verbatim(field, &edit.value);
        }
    }
    Ok(())
}
