//! Formsmith engines: dependency graph, formula interpreter, recomputation
//! and validation.
//!
//! All entry points are pure: they borrow the schema and values and return
//! new structures.

pub mod engine;
pub mod interpreter;
pub mod timezone;
pub mod validation;

pub use engine::{
    DependencyGraph, DeterministicMode, EvalConfig, GraphError, Recomputation, ValuesMap,
    initial_values, recompute, recompute_with_config,
};
pub use interpreter::{Interpreter, ParentValue, evaluate};
pub use timezone::TimeZoneSpec;
pub use validation::{
    ValidationOutcome, ValidationResultMap, effective_rules, is_submittable, validate,
    validate_form, validate_rule,
};

#[cfg(test)]
mod tests;
