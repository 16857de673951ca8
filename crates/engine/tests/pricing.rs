use pricelab_engine::model::{CalcMode, Field, Row, Table};
use pricelab_engine::ordering::is_dense;
use pricelab_engine::presets::FeePresets;
use pricelab_engine::reconcile::recompute;
use pricelab_engine::reducer::{apply_edit, apply_edit_checked, ChangeSet};

use proptest::prelude::*;

fn row(order: u32, label: &str, cost: f64, fee: f64, margin: f64) -> Row {
    Row {
        order,
        label: label.into(),
        cost,
        fee_percent: fee,
        margin_percent: margin,
        ..Row::default()
    }
}

// -------------------------------------------------------------------------
// Worked scenarios
// -------------------------------------------------------------------------

#[test]
fn price_based_round_trip_is_stable() {
    let table = Table::new(vec![row(1, "carrot", 1000.0, 0.0, 20.0)]);
    let once = recompute(&table, CalcMode::PriceBased);
    let r = &once.rows[0];
    assert_eq!(r.selling_price, 1250.0);
    assert_eq!(r.fee_amount, 0.0);
    assert_eq!(r.margin_amount, 250.0);
    assert_eq!(recompute(&once, CalcMode::PriceBased), once);
}

#[test]
fn cost_based_with_fee() {
    let table = Table::new(vec![row(1, "onion", 2000.0, 13.0, 15.0)]);
    let out = recompute(&table, CalcMode::CostBased);
    let r = &out.rows[0];
    assert_eq!(r.selling_price, 2644.0);
    assert_eq!(r.fee_amount, 344.0);
    assert_eq!(r.margin_amount, 300.0);
}

#[test]
fn reverse_row_inverts_the_forward_formula() {
    let mut r = row(1, "[REV] carrot", 0.0, 0.0, 20.0);
    r.reverse = true;
    r.selling_price = 1250.0;
    let out = recompute(&Table::new(vec![r]), CalcMode::PriceBased);
    assert_eq!(out.rows[0].cost, 1000.0);
}

#[test]
fn price_edit_reaches_fixed_point_in_one_pass() {
    let table = recompute(
        &Table::new(vec![row(1, "carrot", 1000.0, 0.0, 20.0)]),
        CalcMode::PriceBased,
    );
    assert_eq!(table.rows[0].selling_price, 1250.0);

    let out = apply_edit(
        &table,
        &ChangeSet::new().edit(0, Field::SellingPrice, 1000.0),
        CalcMode::PriceBased,
    );
    assert_eq!(out.rows[0].margin_percent, 0.0);
    assert_eq!(out.rows[0].selling_price, 1000.0);
    assert_eq!(recompute(&out, CalcMode::PriceBased), out);
}

#[test]
fn order_edit_shifts_to_insert() {
    let table = Table::new(vec![
        row(1, "a", 100.0, 0.0, 0.0),
        row(2, "b", 200.0, 0.0, 0.0),
        row(3, "c", 300.0, 0.0, 0.0),
    ]);
    let out = apply_edit(&table, &ChangeSet::new().edit(2, Field::Order, 1), CalcMode::PriceBased);
    assert_eq!(out.orders(), vec![1, 2, 3]);
    let labels: Vec<&str> = out.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["c", "a", "b"]);
}

#[test]
fn infeasible_pricing_saturates_to_zero() {
    let out = recompute(
        &Table::new(vec![row(1, "x", 1000.0, 60.0, 50.0)]),
        CalcMode::PriceBased,
    );
    assert_eq!(out.rows[0].selling_price, 0.0);
}

#[test]
fn zero_fee_is_an_accepted_preset() {
    let table = recompute(
        &Table::new(vec![row(1, "x", 1000.0, 13.0, 20.0)]),
        CalcMode::PriceBased,
    );
    let (out, report) = apply_edit_checked(
        &table,
        &ChangeSet::new().edit(0, Field::FeePercent, 0.0),
        CalcMode::PriceBased,
        &FeePresets::default(),
    );
    assert!(report.rejected.is_empty());
    assert_eq!(out.rows[0].fee_percent, 0.0);
    assert_eq!(out.rows[0].selling_price, 1250.0);
}

#[test]
fn shorter_table_from_grid_deletion_is_accepted() {
    let table = Table::new(vec![
        row(1, "a", 100.0, 0.0, 0.0),
        row(2, "b", 200.0, 0.0, 0.0),
        row(3, "c", 300.0, 0.0, 0.0),
    ]);
    let shorter = table.without_rows(&[1]);
    let out = apply_edit(&shorter, &ChangeSet::new(), CalcMode::PriceBased);
    assert_eq!(out.orders(), vec![1, 2]);
    assert_eq!(out.rows[1].label, "c");
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

fn arb_row() -> impl Strategy<Value = Row> {
    (
        1u32..20,
        any::<bool>(),
        "[a-e]{0,3}",
        0.0f64..100_000.0,
        prop::sample::select(vec![0.0, 6.0, 13.0, 15.0, 20.0]),
        -50.0f64..120.0,
        0.0f64..60.0,
        0.0f64..150_000.0,
    )
        .prop_map(|(order, reverse, label, cost, fee, margin, target, price)| Row {
            order,
            reverse,
            label,
            cost,
            fee_percent: fee,
            margin_percent: margin,
            target_margin_percent: target,
            selling_price: price,
            ..Row::default()
        })
}

fn arb_mode() -> impl Strategy<Value = CalcMode> {
    prop_oneof![Just(CalcMode::PriceBased), Just(CalcMode::CostBased)]
}

proptest! {
    #[test]
    fn recompute_is_idempotent(rows in prop::collection::vec(arb_row(), 0..12), mode in arb_mode()) {
        let once = recompute(&Table::new(rows), mode);
        let twice = recompute(&once, mode);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn orders_are_dense_after_any_change_set(
        rows in prop::collection::vec(arb_row(), 0..10),
        moves in prop::collection::vec((0usize..12, 0u32..15), 0..6),
        appended in 0usize..3,
        mode in arb_mode(),
    ) {
        let mut changes = ChangeSet::new().append_rows(appended);
        for (idx, order) in moves {
            changes = changes.edit(idx, Field::Order, order as f64);
        }
        let expected_len = rows.len() + appended;
        let out = apply_edit(&Table::new(rows), &changes, mode);
        prop_assert_eq!(out.len(), expected_len);
        prop_assert!(is_dense(&out.rows));
    }

    #[test]
    fn normal_rows_never_get_a_negative_price(rows in prop::collection::vec(arb_row(), 1..8), mode in arb_mode()) {
        let out = recompute(&Table::new(rows), mode);
        for r in out.rows.iter().filter(|r| !r.reverse) {
            prop_assert!(r.selling_price >= 0.0);
        }
    }
}
