//! `pricelab-engine`: margin/price reconciliation engine and grid edit reducer.
//!
//! Pure crate: takes a table and a change-set or mode, returns a new table.
//! No IO dependencies.

pub mod error;
pub mod label;
pub mod model;
pub mod ordering;
pub mod presets;
pub mod reconcile;
pub mod reducer;
pub mod session;
pub mod summary;
pub mod transfer;
pub mod value;

pub use error::{ChangeSetError, RowComputeError};
pub use model::{CalcMode, Field, Row, Table};
pub use presets::FeePresets;
pub use reconcile::recompute;
pub use reducer::{apply_edit, CellEdit, ChangeSet};
pub use session::{PricingSession, Role};
pub use transfer::TransferJoin;
pub use value::CellValue;
