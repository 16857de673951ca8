//! Cell values at the grid boundary.
//!
//! The grid hands over loosely typed JSON scalars. Each field declares what it
//! expects (number, flag or text) and coerces through the helpers here. A value
//! that cannot be coerced falls back to the field's default instead of raising.

use serde::{Deserialize, Deserializer, Serialize};

/// A raw value as emitted by the grid editor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric view. Empty, unparseable text and non-finite numbers yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => *n,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Text(s) => parse_number(s)?,
            CellValue::Empty => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Numeric view with the documented default of 0.
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Flag view. Unrecognized values yield `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Number(n) if n.is_finite() => Some(*n != 0.0),
            CellValue::Number(_) => None,
            CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" | "" => Some(false),
                _ => None,
            },
            CellValue::Empty => Some(false),
        }
    }

    /// Text view. Numbers render without a trailing `.0` when integral.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Parse grid-style numeric text: `"1,250"`, `" 15.5% "`, `"-3"`.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number the way the grid shows it (`1250`, `15.5`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Serde helper: accept any scalar and coerce it to a number, 0 on failure.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CellValue>::deserialize(deserializer)?
        .map(|v| v.number_or_zero())
        .unwrap_or(0.0))
}

/// Serde helper: accept any scalar and coerce it to a flag, `false` on failure.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CellValue>::deserialize(deserializer)?
        .and_then(|v| v.as_bool())
        .unwrap_or(false))
}

/// Serde helper: accept any scalar and render it as text.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CellValue>::deserialize(deserializer)?
        .map(|v| v.to_text())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_is_coerced() {
        assert_eq!(CellValue::from("1,250").as_number(), Some(1250.0));
        assert_eq!(CellValue::from(" 15.5% ").as_number(), Some(15.5));
        assert_eq!(CellValue::from("abc").as_number(), None);
        assert_eq!(CellValue::from("abc").number_or_zero(), 0.0);
        assert_eq!(CellValue::Empty.number_or_zero(), 0.0);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn flags_fail_closed() {
        assert_eq!(CellValue::from("yes").as_bool(), Some(true));
        assert_eq!(CellValue::Number(0.0).as_bool(), Some(false));
        assert_eq!(CellValue::from("maybe").as_bool(), None);
        assert_eq!(CellValue::Empty.as_bool(), Some(false));
    }

    #[test]
    fn untagged_json_scalars() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[1000, true, "abc", null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Number(1000.0),
                CellValue::Bool(true),
                CellValue::Text("abc".into()),
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1250.0).to_text(), "1250");
        assert_eq!(CellValue::Number(15.25).to_text(), "15.25");
    }
}
