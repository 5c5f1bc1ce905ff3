use formsmith_common::FieldValue;
use proptest::prelude::*;

use super::common::{derived, input, schema, values};
use crate::engine::{DependencyGraph, ValuesMap, recompute};
use crate::validation::validate_form;

fn invoice() -> formsmith_schema::FormSchema {
    schema(vec![
        input("qty"),
        input("price"),
        input("shipping"),
        derived("subtotal", &["qty", "price"], "qty * price"),
        derived("total", &["subtotal", "shipping"], "subtotal + shipping"),
        derived("perItem", &["total", "qty"], "total / qty"),
    ])
}

fn inputs(qty: i32, price: i32, shipping: i32) -> ValuesMap {
    values(&[
        ("qty", FieldValue::Number(qty as f64)),
        ("price", FieldValue::Number(price as f64)),
        ("shipping", FieldValue::Number(shipping as f64)),
    ])
}

#[test]
fn invoice_totals() {
    let s = invoice();
    let graph = DependencyGraph::build(&s).unwrap();
    let out = recompute(&s, &graph, &inputs(4, 5, 2), None);
    assert_eq!(out.values["subtotal"], FieldValue::text("20"));
    assert_eq!(out.values["total"], FieldValue::text("22"));
    assert_eq!(out.values["perItem"], FieldValue::text("5.5"));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn recompute_is_idempotent(qty in -50i32..50, price in -50i32..50, shipping in 0i32..20) {
        let s = invoice();
        let graph = DependencyGraph::build(&s).unwrap();
        let once = recompute(&s, &graph, &inputs(qty, price, shipping), None);
        let twice = recompute(&s, &graph, &once.values, None);
        prop_assert_eq!(&once.values, &twice.values);
        prop_assert_eq!(once.errors.keys().collect::<Vec<_>>(), twice.errors.keys().collect::<Vec<_>>());
    }

    #[test]
    fn targeted_matches_full_recompute(qty in 1i32..50, price in 0i32..50, new_price in 0i32..50) {
        let s = invoice();
        let graph = DependencyGraph::build(&s).unwrap();
        let settled = recompute(&s, &graph, &inputs(qty, price, 3), None).values;

        let mut edited = settled.clone();
        edited.insert("price".into(), FieldValue::Number(new_price as f64));
        let targeted = recompute(&s, &graph, &edited, Some("price"));
        let full = recompute(&s, &graph, &edited, None);
        prop_assert_eq!(targeted.values, full.values);
    }

    #[test]
    fn field_declaration_order_does_not_change_results(
        perm in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        qty in 1i32..20,
        price in 0i32..20,
    ) {
        let base = invoice();
        let shuffled = schema(perm.iter().map(|&i| base.fields[i].clone()).collect());

        let a = recompute(&base, &DependencyGraph::build(&base).unwrap(), &inputs(qty, price, 1), None);
        let b = recompute(&shuffled, &DependencyGraph::build(&shuffled).unwrap(), &inputs(qty, price, 1), None);
        prop_assert_eq!(
            validate_form(&base, &a.values),
            validate_form(&shuffled, &b.values)
        );
        prop_assert_eq!(a.values, b.values);
    }
}
