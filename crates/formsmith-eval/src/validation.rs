//! Per-field validation rules.
//!
//! Rules run in declared order and the first failure wins. Derived fields are
//! never validated. Length, email and password rules only look at text
//! values; any other value passes them.

use std::collections::BTreeMap;

use formsmith_common::FieldValue;
use formsmith_schema::{Field, FormSchema, RuleKind, ValidationRule};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::ValuesMap;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
});

const PASSWORD_MIN_LEN: usize = 8;

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Field id -> outcome.
pub type ValidationResultMap = BTreeMap<String, ValidationOutcome>;

/// Check `value` against a single rule.
pub fn validate_rule(rule: &ValidationRule, value: &FieldValue) -> ValidationOutcome {
    if rule_passes(rule, value) {
        ValidationOutcome::valid()
    } else {
        ValidationOutcome::invalid(rule.message.clone())
    }
}

fn rule_passes(rule: &ValidationRule, value: &FieldValue) -> bool {
    match rule.kind {
        RuleKind::Required => !value.is_blank(),
        RuleKind::MinLength => match (value, rule.bound) {
            (FieldValue::Text(s), Some(bound)) => s.chars().count() as f64 >= bound,
            _ => true,
        },
        RuleKind::MaxLength => match (value, rule.bound) {
            (FieldValue::Text(s), Some(bound)) => s.chars().count() as f64 <= bound,
            _ => true,
        },
        RuleKind::Email => match value {
            FieldValue::Text(s) => EMAIL_PATTERN.is_match(s),
            _ => true,
        },
        RuleKind::Password => match value {
            FieldValue::Text(s) => {
                s.chars().count() >= PASSWORD_MIN_LEN && s.chars().any(|c| c.is_ascii_digit())
            }
            _ => true,
        },
    }
}

/// Rules actually applied to `field`: a `required` field without an explicit
/// `required` rule gets an implicit one in front.
pub fn effective_rules(field: &Field) -> Vec<ValidationRule> {
    let mut rules = Vec::with_capacity(field.validation_rules.len() + 1);
    let explicit_required = field
        .validation_rules
        .iter()
        .any(|r| r.kind == RuleKind::Required);
    if field.required && !explicit_required {
        rules.push(ValidationRule::required(format!("{} is required", field.label)));
    }
    rules.extend(field.validation_rules.iter().cloned());
    rules
}

/// Validate one field's value. Derived fields always pass.
pub fn validate(field: &Field, value: &FieldValue) -> ValidationOutcome {
    if field.is_derived() {
        return ValidationOutcome::valid();
    }
    effective_rules(field)
        .iter()
        .map(|rule| validate_rule(rule, value))
        .find(|outcome| !outcome.valid)
        .unwrap_or_else(ValidationOutcome::valid)
}

/// Validate every non-derived field; a missing value counts as empty.
pub fn validate_form(schema: &FormSchema, values: &ValuesMap) -> ValidationResultMap {
    let empty = FieldValue::Empty;
    schema
        .fields
        .iter()
        .filter(|f| !f.is_derived())
        .map(|f| {
            let value = values.get(&f.id).unwrap_or(&empty);
            (f.id.clone(), validate(f, value))
        })
        .collect()
}

pub fn is_submittable(results: &ValidationResultMap) -> bool {
    results.values().all(|o| o.valid)
}
