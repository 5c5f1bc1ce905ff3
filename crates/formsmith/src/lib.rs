//! Meta crate that re-exports the Formsmith building blocks with sensible
//! defaults. Downstream users can depend on this crate and opt into specific
//! layers via feature flags while keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use formsmith_common as common;

#[cfg(feature = "parse")]
pub use formsmith_parse as parse;

#[cfg(feature = "schema")]
pub use formsmith_schema as schema;

#[cfg(feature = "eval")]
pub use formsmith_eval as eval;

#[cfg(feature = "store")]
pub use formsmith_store as store;

#[cfg(feature = "builder")]
pub use formsmith_builder as builder;

#[cfg(feature = "common")]
pub use formsmith_common::{CycleError, FieldType, FieldValue, FormulaError, FormulaErrorKind};

#[cfg(feature = "schema")]
pub use formsmith_schema::{Field, FormSchema, SavedForm, SchemaError, ValidationRule};

#[cfg(feature = "eval")]
pub use formsmith_eval::{DependencyGraph, EvalConfig, ValuesMap, recompute, validate_form};

#[cfg(feature = "builder")]
pub use formsmith_builder::{BuilderConfig, FormBuilder, PreviewSession};

#[cfg(feature = "eval")]
pub mod doc_examples;
