use std::fmt;

use crate::model::Field;

/// Why a single row could not be recomputed. The engine keeps the row's
/// previous values and moves on; callers only see this through logging and
/// [`RecomputeReport`](crate::reconcile::RecomputeReport).
#[derive(Debug, Clone, PartialEq)]
pub enum RowComputeError {
    /// An input field holds NaN or an infinity.
    NonFinite { field: Field, value: f64 },
    /// A formula divided by zero where no saturation policy applies.
    DivisionByZero { formula: &'static str },
}

impl fmt::Display for RowComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field, value } => {
                write!(f, "field '{field}' is not a finite number ({value})")
            }
            Self::DivisionByZero { formula } => write!(f, "division by zero in {formula}"),
        }
    }
}

impl std::error::Error for RowComputeError {}

/// A grid payload that does not have the change-set shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSetError {
    /// JSON parse error.
    Parse(String),
    /// A section has the wrong JSON type.
    Shape { section: &'static str, expected: &'static str },
    /// An `edited_rows` key is not a row index.
    RowKey(String),
}

impl fmt::Display for ChangeSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "change-set parse error: {msg}"),
            Self::Shape { section, expected } => {
                write!(f, "change-set section '{section}' must be {expected}")
            }
            Self::RowKey(key) => write!(f, "edited_rows key '{key}' is not a row index"),
        }
    }
}

impl std::error::Error for ChangeSetError {}
