//! Form schema model for Formsmith.
//!
//! Defines the serde representation of form definitions and saved snapshots,
//! structural linting ([`FormSchema::validate`]) and the JSON Schema of the
//! saved-forms file.

mod model;
mod validation;

pub use model::{
    DefaultValue, DerivedSpec, Field, FormSchema, RuleKind, SavedForm, SelectOption, Timestamp,
    ValidationRule,
};
pub use validation::{SchemaError, SchemaIssue};

pub use formsmith_common::{FieldType, FieldValue};

use once_cell::sync::Lazy;

static SCHEMA_JSON: Lazy<String> = Lazy::new(generate_schema_json_pretty);

/// JSON Schema describing a saved-forms file (an array of [`SavedForm`]).
pub fn schema_json() -> &'static str {
    SCHEMA_JSON.as_str()
}

pub fn generate_schema_value() -> serde_json::Value {
    let schema = schemars::schema_for!(Vec<SavedForm>);
    serde_json::to_value(&schema).expect("saved-forms schema must serialize")
}

pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value()).expect("schema value must serialize")
}
