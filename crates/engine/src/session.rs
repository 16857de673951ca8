//! Workspace state owned by the calling harness.
//!
//! The session bundles the table with the settings the reducer and engine
//! need (mode, role, fee presets). Every operation goes through the pure
//! functions in [`reducer`](crate::reducer) and [`reconcile`](crate::reconcile).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{CalcMode, Table};
use crate::presets::FeePresets;
use crate::reconcile::recompute;
use crate::reducer::{apply_edit_checked, finalize, ChangeSet, EditReport};
use crate::transfer::{apply_counterpart_prices, TransferJoin, TransferReport};

/// The two workspaces that trade prices with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    VendorA,
    VendorB,
}

impl Role {
    pub fn counterparty(self) -> Self {
        match self {
            Self::VendorA => Self::VendorB,
            Self::VendorB => Self::VendorA,
        }
    }

    /// Display name, also used in worksheet names (`For_Vendor_B`).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::VendorA => "Vendor A",
            Self::VendorB => "Vendor B",
        }
    }

    /// Worksheet this role receives counterpart prices in.
    pub fn inbox_worksheet(self) -> String {
        format!("For_{}", self.display_name().replace(' ', "_"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VendorA => write!(f, "vendor_a"),
            Self::VendorB => write!(f, "vendor_b"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "a" | "vendor_a" => Ok(Self::VendorA),
            "b" | "vendor_b" => Ok(Self::VendorB),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSession {
    pub table: Table,
    pub mode: CalcMode,
    pub role: Role,
    pub fee_presets: FeePresets,
}

impl PricingSession {
    pub fn new(table: Table, mode: CalcMode, role: Role, fee_presets: FeePresets) -> Self {
        let table = recompute(&table, mode);
        Self {
            table,
            mode,
            role,
            fee_presets,
        }
    }

    /// Apply one grid change-set.
    pub fn apply(&mut self, changes: &ChangeSet) -> EditReport {
        let (table, report) = apply_edit_checked(&self.table, changes, self.mode, &self.fee_presets);
        self.table = table;
        report
    }

    /// Switch the margin basis and recompute under it. No reducer logic runs.
    pub fn set_mode(&mut self, mode: CalcMode) {
        if mode != self.mode {
            log::debug!("mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.table = recompute(&self.table, mode);
    }

    /// Replace the table wholesale (load from storage, import) and normalize it.
    pub fn replace_table(&mut self, table: Table) {
        self.table = finalize(table.rows, self.mode);
    }

    /// Drop rows deleted in the grid, then renumber and recompute.
    pub fn delete_rows(&mut self, indices: &[usize]) {
        let remaining = self.table.without_rows(indices);
        self.table = finalize(remaining.rows, self.mode);
    }

    /// Take the counterpart's selling prices as this workspace's costs.
    pub fn receive_prices(&mut self, counterpart: &Table, join: TransferJoin) -> TransferReport {
        let (table, report) = apply_counterpart_prices(&self.table, counterpart, join, self.mode);
        self.table = table;
        report
    }
}

impl Default for PricingSession {
    fn default() -> Self {
        Self::new(
            Table::sample(),
            CalcMode::default(),
            Role::default(),
            FeePresets::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn default_session_is_recomputed() {
        let session = PricingSession::default();
        // 1000 / (1 - 0.15)
        assert_eq!(session.table.rows[0].selling_price, 1176.0);
    }

    #[test]
    fn mode_switch_only_recomputes() {
        let mut session = PricingSession::default();
        let before = session.table.orders();
        session.set_mode(CalcMode::CostBased);
        assert_eq!(session.table.orders(), before);
        // 1000 * 1.15
        assert_eq!(session.table.rows[0].selling_price, 1150.0);
    }

    #[test]
    fn delete_renumbers() {
        let mut session = PricingSession::default();
        session.apply(&ChangeSet::new().append_rows(1));
        session.delete_rows(&[0]);
        assert_eq!(session.table.orders(), vec![1, 2]);
        assert_eq!(session.table.rows[0].label, "Organic onion");
    }

    #[test]
    fn apply_checks_presets() {
        let mut session = PricingSession::default();
        let report = session.apply(&ChangeSet::new().edit(0, Field::FeePercent, 99.0));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(session.table.rows[0].fee_percent, 0.0);
    }

    #[test]
    fn roles_name_each_others_inbox() {
        assert_eq!(Role::VendorA.counterparty().inbox_worksheet(), "For_Vendor_B");
        assert_eq!(Role::VendorB.counterparty().inbox_worksheet(), "For_Vendor_A");
        assert_eq!("b".parse::<Role>().unwrap(), Role::VendorB);
    }
}
