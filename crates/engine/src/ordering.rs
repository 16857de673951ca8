//! Manual sort key maintenance.
//!
//! Moving a row inserts it at the new position and shifts its neighbours; it
//! never swaps. After every reducer pass the orders are renumbered to a dense
//! `1..=N` sequence.

use std::cmp::Ordering;

use crate::model::Row;

/// Move the row at `index` to `new_order`, shifting the rows in between.
///
/// Moving up (`new_order <= old`): every other row at or after `new_order`
/// moves back one slot. Moving down (`new_order > old`): the rows in
/// `(old, new_order]` move forward one slot to close the hole.
pub fn move_row(rows: &mut [Row], index: usize, new_order: u32) {
    let Some(old_order) = rows.get(index).map(|r| r.order) else {
        return;
    };
    let new_order = new_order.max(1);

    for (i, row) in rows.iter_mut().enumerate() {
        if i == index {
            continue;
        }
        if new_order <= old_order {
            if row.order >= new_order {
                row.order = row.order.saturating_add(1);
            }
        } else if row.order > old_order && row.order <= new_order {
            row.order -= 1;
        }
    }
    rows[index].order = new_order;
}

/// Canonical sequence: order ascending, label ascending as tie-break.
pub fn compare_rows(a: &Row, b: &Row) -> Ordering {
    a.order.cmp(&b.order).then_with(|| a.label.cmp(&b.label))
}

/// Sort into canonical sequence and renumber densely from 1.
pub fn normalize(rows: &mut Vec<Row>) {
    rows.sort_by(compare_rows);
    for (i, row) in rows.iter_mut().enumerate() {
        row.order = (i + 1) as u32;
    }
}

/// True when orders, in sequence, are exactly `1..=N`.
pub fn is_dense(rows: &[Row]) -> bool {
    rows.iter().enumerate().all(|(i, r)| r.order as usize == i + 1)
}
