use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::value::{lenient_bool, lenient_f64, lenient_string, CellValue};

// ---------------------------------------------------------------------------
// Calculation mode
// ---------------------------------------------------------------------------

/// Global margin basis. Selects which pricing formula the engine solves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMode {
    /// Margin is a share of the selling price: `price = cost / (1 - margin - fee)`.
    #[default]
    PriceBased,
    /// Margin is a markup on cost: `price = cost * (1 + margin) / (1 - fee)`.
    CostBased,
}

impl fmt::Display for CalcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceBased => write!(f, "price_based"),
            Self::CostBased => write!(f, "cost_based"),
        }
    }
}

impl FromStr for CalcMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "price" | "price_based" | "pricebased" => Ok(Self::PriceBased),
            "cost" | "cost_based" | "costbased" => Ok(Self::CostBased),
            other => Err(format!("unknown calculation mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Every column of a pricing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Order,
    Reverse,
    Label,
    Spec,
    Cost,
    TargetMarginPercent,
    MarginPercent,
    TargetGapAmount,
    MarginAmount,
    FeePercent,
    FeeAmount,
    SellingPrice,
}

impl Field {
    /// Display order of the columns, matching the grid layout.
    pub const ALL: [Field; 12] = [
        Field::Order,
        Field::Reverse,
        Field::Label,
        Field::Spec,
        Field::Cost,
        Field::TargetMarginPercent,
        Field::MarginPercent,
        Field::TargetGapAmount,
        Field::MarginAmount,
        Field::FeePercent,
        Field::FeeAmount,
        Field::SellingPrice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Order => "order",
            Field::Reverse => "reverse",
            Field::Label => "label",
            Field::Spec => "spec",
            Field::Cost => "cost",
            Field::TargetMarginPercent => "target_margin_percent",
            Field::MarginPercent => "margin_percent",
            Field::TargetGapAmount => "target_gap_amount",
            Field::MarginAmount => "margin_amount",
            Field::FeePercent => "fee_percent",
            Field::FeeAmount => "fee_amount",
            Field::SellingPrice => "selling_price",
        }
    }

    /// Derived columns are recomputed on every pass and never accept edits.
    pub fn is_derived(self) -> bool {
        matches!(self, Field::FeeAmount | Field::MarginAmount | Field::TargetGapAmount)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    /// Accepts snake_case column names and the camelCase names of the grid payload.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        let field = match key.as_str() {
            "order" => Field::Order,
            "reverse" | "reverseflag" => Field::Reverse,
            "label" => Field::Label,
            "spec" => Field::Spec,
            "cost" => Field::Cost,
            "targetmarginpercent" | "targetmargin" => Field::TargetMarginPercent,
            "marginpercent" | "margin" => Field::MarginPercent,
            "targetgapamount" | "targetgap" => Field::TargetGapAmount,
            "marginamount" => Field::MarginAmount,
            "feepercent" | "fee" => Field::FeePercent,
            "feeamount" => Field::FeeAmount,
            "sellingprice" | "price" => Field::SellingPrice,
            _ => return Err(format!("unknown field: {s}")),
        };
        Ok(field)
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One priced product line.
///
/// Every field deserializes leniently: a missing or malformed value lands as
/// the field's default (0, `false`, empty) instead of failing the whole table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    #[serde(deserialize_with = "lenient_order")]
    pub order: u32,
    #[serde(deserialize_with = "lenient_bool")]
    pub reverse: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(deserialize_with = "lenient_string")]
    pub spec: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub cost: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub target_margin_percent: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_percent: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub target_gap_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub fee_percent: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub fee_amount: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub selling_price: f64,
}

impl Row {
    /// A blank appended row: zeroed numerics, normal direction, empty label.
    pub fn blank(order: u32) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn new(order: u32, label: &str, spec: &str, cost: f64) -> Self {
        Self {
            order,
            label: label.to_string(),
            spec: spec.to_string(),
            cost,
            ..Self::default()
        }
    }

    /// Read a field as a grid value.
    pub fn get(&self, field: Field) -> CellValue {
        match field {
            Field::Order => CellValue::Number(self.order as f64),
            Field::Reverse => CellValue::Bool(self.reverse),
            Field::Label => CellValue::Text(self.label.clone()),
            Field::Spec => CellValue::Text(self.spec.clone()),
            Field::Cost => CellValue::Number(self.cost),
            Field::TargetMarginPercent => CellValue::Number(self.target_margin_percent),
            Field::MarginPercent => CellValue::Number(self.margin_percent),
            Field::TargetGapAmount => CellValue::Number(self.target_gap_amount),
            Field::MarginAmount => CellValue::Number(self.margin_amount),
            Field::FeePercent => CellValue::Number(self.fee_percent),
            Field::FeeAmount => CellValue::Number(self.fee_amount),
            Field::SellingPrice => CellValue::Number(self.selling_price),
        }
    }

    /// Store a value verbatim (after schema coercion), with no side effects.
    ///
    /// Returns `false` when the field does not accept direct writes.
    pub fn set_verbatim(&mut self, field: Field, value: &CellValue) -> bool {
        match field {
            Field::Order => self.order = coerce_order(value).unwrap_or(self.order),
            Field::Reverse => self.reverse = value.as_bool().unwrap_or(false),
            Field::Label => self.label = value.to_text(),
            Field::Spec => self.spec = value.to_text(),
            Field::Cost => self.cost = value.number_or_zero(),
            Field::TargetMarginPercent => self.target_margin_percent = value.number_or_zero(),
            Field::MarginPercent => self.margin_percent = value.number_or_zero(),
            Field::FeePercent => self.fee_percent = value.number_or_zero(),
            Field::SellingPrice => self.selling_price = value.number_or_zero(),
            Field::TargetGapAmount | Field::MarginAmount | Field::FeeAmount => return false,
        }
        true
    }

    /// Copy the derived columns from another row.
    pub(crate) fn copy_derived_from(&mut self, other: &Row) {
        self.fee_amount = other.fee_amount;
        self.margin_amount = other.margin_amount;
        self.target_gap_amount = other.target_gap_amount;
    }
}

/// Orders are positive integers; fractional input truncates, anything below 1 clamps to 1.
pub fn coerce_order(value: &CellValue) -> Option<u32> {
    let n = value.as_number()?.trunc();
    if n < 1.0 {
        Some(1)
    } else if n >= u32::MAX as f64 {
        Some(u32::MAX)
    } else {
        Some(n as u32)
    }
}

fn lenient_order<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CellValue>::deserialize(deserializer)?
        .and_then(|v| coerce_order(&v))
        .unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An ordered sequence of rows. `order` defines the canonical sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// The starter sheet a fresh workspace opens with.
    pub fn sample() -> Self {
        let mut carrot = Row::new(1, "Organic carrot", "1kg", 1000.0);
        carrot.target_margin_percent = 20.0;
        carrot.margin_percent = 15.0;
        let mut onion = Row::new(2, "Organic onion", "500g", 2000.0);
        onion.target_margin_percent = 20.0;
        onion.margin_percent = 15.0;
        Self::new(vec![carrot, onion])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Orders in table sequence.
    pub fn orders(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.order).collect()
    }

    /// Drop rows by position (grid-level deletion). Out-of-range indices are ignored.
    pub fn without_rows(&self, indices: &[usize]) -> Table {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, r)| r.clone())
            .collect();
        Table::new(rows)
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip_through_from_str() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert_eq!("sellingPrice".parse::<Field>().unwrap(), Field::SellingPrice);
        assert_eq!("reverseFlag".parse::<Field>().unwrap(), Field::Reverse);
        assert!("discount".parse::<Field>().is_err());
    }

    #[test]
    fn malformed_numbers_deserialize_as_zero() {
        let row: Row = serde_json::from_str(
            r#"{"order": 1, "label": "x", "cost": "n/a", "fee_percent": null, "reverse": "yes"}"#,
        )
        .unwrap();
        assert_eq!(row.cost, 0.0);
        assert_eq!(row.fee_percent, 0.0);
        assert_eq!(row.margin_percent, 0.0);
        assert!(row.reverse);
    }

    #[test]
    fn derived_fields_reject_direct_writes() {
        let mut row = Row::blank(1);
        assert!(!row.set_verbatim(Field::FeeAmount, &CellValue::Number(99.0)));
        assert_eq!(row.fee_amount, 0.0);
        assert!(row.set_verbatim(Field::Cost, &CellValue::from("1,500")));
        assert_eq!(row.cost, 1500.0);
    }

    #[test]
    fn order_coercion_truncates_and_clamps() {
        assert_eq!(coerce_order(&CellValue::Number(2.9)), Some(2));
        assert_eq!(coerce_order(&CellValue::Number(-4.0)), Some(1));
        assert_eq!(coerce_order(&CellValue::from("x")), None);
    }

    #[test]
    fn mode_parses_short_names() {
        assert_eq!("cost".parse::<CalcMode>().unwrap(), CalcMode::CostBased);
        assert_eq!("price-based".parse::<CalcMode>().unwrap(), CalcMode::PriceBased);
    }
}
