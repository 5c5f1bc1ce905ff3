use formsmith_common::{FieldType, FieldValue};
use formsmith_schema::{Field, FormSchema};

use crate::engine::ValuesMap;

/// Plain number input.
pub fn input(id: &str) -> Field {
    Field::new(id, FieldType::Number, id.to_uppercase())
}

/// Number field computed from `parents` with `formula`.
pub fn derived(id: &str, parents: &[&str], formula: &str) -> Field {
    Field::new(id, FieldType::Number, id.to_uppercase())
        .with_formula(parents.iter().copied(), formula)
}

pub fn schema(fields: Vec<Field>) -> FormSchema {
    FormSchema::new("test", "Test", fields)
}

pub fn values(pairs: &[(&str, FieldValue)]) -> ValuesMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
