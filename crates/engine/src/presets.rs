use serde::{Deserialize, Serialize};

/// The fee percentages offered in the fee dropdown.
///
/// Always sorted, de-duplicated and containing 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeePresets {
    values: Vec<f64>,
}

pub const DEFAULT_FEE_PRESETS: [f64; 5] = [0.0, 6.0, 13.0, 15.0, 20.0];

impl FeePresets {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        // -0.0 folds into 0.0 so total_cmp sorts them together
        let mut values: Vec<f64> = values
            .into_iter()
            .filter(|v| v.is_finite())
            .map(|v| if v == 0.0 { 0.0 } else { v })
            .collect();
        values.push(0.0);
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn contains(&self, fee_percent: f64) -> bool {
        self.values.iter().any(|v| (v - fee_percent).abs() < 1e-9)
    }
}

impl Default for FeePresets {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_PRESETS)
    }
}

impl From<Vec<f64>> for FeePresets {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<FeePresets> for Vec<f64> {
    fn from(presets: FeePresets) -> Self {
        presets.values
    }
}
