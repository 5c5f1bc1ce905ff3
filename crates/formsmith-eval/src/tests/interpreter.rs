use chrono::TimeZone;
use formsmith_common::{FieldType, FieldValue, FormulaErrorKind};

use crate::engine::EvalConfig;
use crate::interpreter::{ParentValue, evaluate};

fn fixed_config() -> EvalConfig {
    let fixed = chrono::Utc
        .with_ymd_and_hms(2025, 1, 15, 10, 0, 0)
        .single()
        .expect("valid fixed timestamp");
    EvalConfig::deterministic(fixed)
}

fn eval(formula: &str, parents: &[ParentValue<'_>]) -> FieldValue {
    evaluate(formula, parents, &fixed_config()).expect("formula should evaluate")
}

fn eval_err(formula: &str, parents: &[ParentValue<'_>]) -> FormulaErrorKind {
    evaluate(formula, parents, &fixed_config())
        .expect_err("formula should fail")
        .kind
}

/* ─────────────── arithmetic ─────────────── */

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval("2 + 3 * 4", &[]), FieldValue::text("14"));
    assert_eq!(eval("(2 + 3) * 4", &[]), FieldValue::text("20"));
    assert_eq!(eval("10 / 4", &[]), FieldValue::text("2.5"));
    assert_eq!(eval("8 - 2 - 1", &[]), FieldValue::text("5"));
}

#[test]
fn unary_operators_and_negative_zero() {
    assert_eq!(eval("-3 + 5", &[]), FieldValue::text("2"));
    assert_eq!(eval("-(2 * 3)", &[]), FieldValue::text("-6"));
    assert_eq!(eval("--4", &[]), FieldValue::text("4"));
    assert_eq!(eval("-0 * 5", &[]), FieldValue::text("0"));
}

#[test]
fn malformed_arithmetic_is_an_error() {
    assert_eq!(eval_err("(1+2)/0", &[]), FormulaErrorKind::InvalidExpression);
    assert_eq!(eval_err("0/0", &[]), FormulaErrorKind::InvalidExpression);
    assert_eq!(eval_err("(1 + 2", &[]), FormulaErrorKind::InvalidExpression);
    assert_eq!(eval_err("1 +", &[]), FormulaErrorKind::InvalidExpression);
    assert_eq!(eval_err("1..2 + 3", &[]), FormulaErrorKind::InvalidExpression);
    assert_eq!(eval_err("* 3", &[]), FormulaErrorKind::InvalidExpression);
}

#[test]
fn deep_nesting_is_an_error_not_a_crash() {
    let parens = format!("{}1{}", "(".repeat(2000), ")".repeat(2000));
    assert_eq!(eval_err(&parens, &[]), FormulaErrorKind::InvalidExpression);

    let prefixes = format!("{}1", "-".repeat(4000));
    assert_eq!(eval_err(&prefixes, &[]), FormulaErrorKind::InvalidExpression);

    // Concatenation that fails to parse falls back to display text.
    let quoted = format!("{}\"a\"{}", "(".repeat(1000), ")".repeat(1000));
    assert_eq!(eval(&quoted, &[]), FieldValue::text(quoted.clone()));
}

#[test]
fn long_flat_chains_still_evaluate() {
    let sum = format!("{}1", "1+".repeat(1999));
    assert_eq!(eval(&sum, &[]), FieldValue::text("2000"));
    let moderate = format!("{}7{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(eval(&moderate, &[]), FieldValue::text("7"));
}

#[test]
fn empty_formula_is_empty_text() {
    assert_eq!(eval("", &[]), FieldValue::text(""));
    assert_eq!(eval("   ", &[]), FieldValue::text(""));
}

#[test]
fn overlong_formula_rejected() {
    let config = EvalConfig {
        max_formula_len: 5,
        ..fixed_config()
    };
    let err = evaluate("1 + 2 + 3", &[], &config).unwrap_err();
    assert_eq!(err.kind, FormulaErrorKind::TooLong);
}

/* ─────────────── substitution ─────────────── */

#[test]
fn numeric_parents_are_substituted_raw() {
    let a = FieldValue::Number(2.0);
    let b = FieldValue::text("3");
    let parents = [
        ParentValue::new("a", FieldType::Number, &a),
        ParentValue::new("b", FieldType::Number, &b),
    ];
    assert_eq!(eval("a + b", &parents), FieldValue::text("5"));
    assert_eq!(eval("a * b - 1", &parents), FieldValue::text("5"));
}

#[test]
fn ids_match_only_at_boundaries() {
    let a = FieldValue::Number(2.0);
    let ab = FieldValue::Number(10.0);
    let parents = [
        ParentValue::new("a", FieldType::Number, &a),
        ParentValue::new("ab", FieldType::Number, &ab),
    ];
    assert_eq!(eval("ab - a", &parents), FieldValue::text("8"));
}

#[test]
fn numeric_looking_ids_do_not_match_inside_numbers() {
    let v = FieldValue::Number(4.0);
    let parents = [ParentValue::new("1714555790000", FieldType::Number, &v)];
    assert_eq!(eval("1714555790000 * 2", &parents), FieldValue::text("8"));
    assert_eq!(eval("17145557900001 - 1", &parents), FieldValue::text("17145557900000"));
}

#[test]
fn text_parents_are_quoted_and_concatenate() {
    let first = FieldValue::text("Ada");
    let last = FieldValue::text("Lovelace");
    let parents = [
        ParentValue::new("first", FieldType::Text, &first),
        ParentValue::new("last", FieldType::Text, &last),
    ];
    assert_eq!(
        eval("first + \" \" + last", &parents),
        FieldValue::text("Ada Lovelace")
    );
    assert_eq!(eval("\"n\" + 1 + 2", &[]), FieldValue::text("n12"));
    assert_eq!(eval("(1 + 2) + \"n\"", &[]), FieldValue::text("3n"));
}

#[test]
fn anything_else_is_display_text() {
    let name = FieldValue::text("Ada");
    let parents = [ParentValue::new("name", FieldType::Text, &name)];
    assert_eq!(
        eval("Hello name!", &parents),
        FieldValue::text("Hello \"Ada\"!")
    );
    // Subtraction on text is outside the concatenation grammar.
    assert_eq!(eval("name - 1", &parents), FieldValue::text("\"Ada\" - 1"));
    assert_eq!(
        eval("process.exit(1)", &[]),
        FieldValue::text("process.exit(1)")
    );
}

#[test]
fn non_numeric_number_parent_is_quoted() {
    let v = FieldValue::text("abc");
    let parents = [ParentValue::new("q", FieldType::Number, &v)];
    assert_eq!(eval("q * 2", &parents), FieldValue::text("\"abc\" * 2"));
}

#[test]
fn empty_boolean_list_and_error_parents() {
    let empty = FieldValue::Empty;
    let flag = FieldValue::Boolean(true);
    let list = FieldValue::List(vec!["x".into(), "y".into()]);
    let broken = FieldValue::Error(formsmith_common::FormulaError::invalid_expression());
    let parents = [
        ParentValue::new("e", FieldType::Text, &empty),
        ParentValue::new("f", FieldType::Checkbox, &flag),
        ParentValue::new("l", FieldType::Select, &list),
        ParentValue::new("x", FieldType::Text, &broken),
    ];
    assert_eq!(eval("e + \"!\"", &parents), FieldValue::text("!"));
    assert_eq!(eval("f", &parents), FieldValue::text("true"));
    assert_eq!(eval("l", &parents), FieldValue::text("[\"x\",\"y\"]"));
    assert_eq!(
        eval("x + \"\"", &parents),
        FieldValue::text("Error in calculation")
    );
}

/* ─────────────── age shorthand ─────────────── */

#[test]
fn age_from_birth_date() {
    let birth = FieldValue::text("2000-06-01");
    let parents = [ParentValue::new("birthDate", FieldType::Date, &birth)];
    assert_eq!(eval("age from birthDate", &parents), FieldValue::text("25"));

    let stamp = FieldValue::text("1990-12-31T23:00:00Z");
    let parents = [ParentValue::new("dob", FieldType::Date, &stamp)];
    assert_eq!(eval("age", &parents), FieldValue::text("35"));
}

#[test]
fn age_with_empty_or_bad_date() {
    let empty = FieldValue::text("");
    let parents = [ParentValue::new("dob", FieldType::Date, &empty)];
    assert_eq!(eval("age", &parents), FieldValue::text(""));

    let bad = FieldValue::text("not a date");
    let parents = [ParentValue::new("dob", FieldType::Date, &bad)];
    assert_eq!(eval_err("age", &parents), FormulaErrorKind::InvalidDate);
}

#[test]
fn age_needs_a_single_date_parent() {
    let birth = FieldValue::text("2000-06-01");
    let other = FieldValue::Number(1.0);
    let parents = [
        ParentValue::new("dob", FieldType::Date, &birth),
        ParentValue::new("n", FieldType::Number, &other),
    ];
    // Two parents: plain substitution, shown as text.
    assert_eq!(
        eval("age dob", &parents),
        FieldValue::text("age \"2000-06-01\"")
    );
}
