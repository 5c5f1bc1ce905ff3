use formsmith_common::{ERROR_SENTINEL_TEXT, FieldValue, FormulaErrorKind};

use super::common::{derived, input, schema, values};
use crate::engine::{DependencyGraph, EvalConfig, recompute, recompute_with_config};

#[test]
fn failing_formula_stores_sentinel_and_records_error() {
    let s = schema(vec![
        input("a"),
        derived("bad", &["a"], "a / 0"),
        derived("good", &["a"], "a + 1"),
    ]);
    let graph = DependencyGraph::build(&s).unwrap();
    let current = values(&[("a", FieldValue::Number(4.0))]);

    let out = recompute(&s, &graph, &current, None);
    assert!(!out.is_clean());
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors["bad"].kind, FormulaErrorKind::InvalidExpression);
    assert!(out.values["bad"].is_error());
    assert_eq!(out.values["bad"].to_string(), ERROR_SENTINEL_TEXT);
    // Evaluation keeps going past the failure.
    assert_eq!(out.values["good"], FieldValue::text("5"));
}

#[test]
fn dependents_see_the_sentinel_text() {
    let s = schema(vec![
        input("a"),
        derived("bad", &["a"], "(a"),
        formsmith_schema::Field::new("label", formsmith_common::FieldType::Text, "Label")
            .with_formula(["bad"], "\"Total: \" + bad"),
    ]);
    let graph = DependencyGraph::build(&s).unwrap();
    let current = values(&[("a", FieldValue::Number(1.0))]);

    let out = recompute(&s, &graph, &current, Some("a"));
    assert!(out.errors.contains_key("bad"));
    assert!(!out.errors.contains_key("label"));
    assert_eq!(
        out.values["label"],
        FieldValue::text(format!("Total: {ERROR_SENTINEL_TEXT}"))
    );
}

#[test]
fn arithmetic_on_sentinel_is_display_text() {
    let s = schema(vec![
        input("a"),
        derived("bad", &["a"], "a / 0"),
        derived("next", &["bad"], "bad * 2"),
    ]);
    let graph = DependencyGraph::build(&s).unwrap();
    let current = values(&[("a", FieldValue::Number(1.0))]);

    let out = recompute(&s, &graph, &current, None);
    assert_eq!(
        out.values["next"],
        FieldValue::text(format!("\"{ERROR_SENTINEL_TEXT}\" * 2"))
    );
}

#[test]
fn error_clears_once_input_is_fixed() {
    let s = schema(vec![input("a"), input("b"), derived("q", &["a", "b"], "a / b")]);
    let graph = DependencyGraph::build(&s).unwrap();

    let broken = values(&[("a", FieldValue::Number(1.0)), ("b", FieldValue::Number(0.0))]);
    let out = recompute(&s, &graph, &broken, None);
    assert!(out.errors.contains_key("q"));

    let mut fixed = out.values.clone();
    fixed.insert("b".into(), FieldValue::Number(4.0));
    let out = recompute(&s, &graph, &fixed, Some("b"));
    assert!(out.is_clean());
    assert_eq!(out.values["q"], FieldValue::text("0.25"));
}

#[test]
fn overlong_formula_is_reported() {
    let s = schema(vec![input("a"), derived("x", &["a"], "a + 1 + 1 + 1")]);
    let graph = DependencyGraph::build(&s).unwrap();
    let config = EvalConfig {
        max_formula_len: 4,
        ..EvalConfig::default()
    };
    let out = recompute_with_config(&s, &graph, &values(&[]), None, &config);
    assert_eq!(out.errors["x"].kind, FormulaErrorKind::TooLong);
}
