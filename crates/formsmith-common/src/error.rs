//! Error values produced while computing derived fields.
//!
//! - **`FormulaErrorKind`** : why a formula could not be evaluated
//! - **`FormulaError`**     : kind plus an optional human explanation
//! - **`CycleError`**       : schema-level failure naming every field on a cycle
//!
//! A `FormulaError` is data, not a fault: the orchestrator stores it next to
//! the field and keeps computing the rest of the form.

use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Text shown in place of a derived value whose formula failed.
pub const ERROR_SENTINEL_TEXT: &str = "Error in calculation";

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormulaErrorKind {
    /// Arithmetic that does not parse or does not produce a finite number.
    InvalidExpression,
    /// The age shorthand was given a parent value that is not a date.
    InvalidDate,
    /// The formula exceeds the configured length limit.
    TooLong,
}

impl fmt::Display for FormulaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidExpression => "invalid expression",
            Self::InvalidDate => "invalid date",
            Self::TooLong => "formula too long",
        })
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormulaError {
    pub kind: FormulaErrorKind,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub message: Option<String>,
}

impl From<FormulaErrorKind> for FormulaError {
    fn from(kind: FormulaErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

impl FormulaError {
    pub fn new(kind: FormulaErrorKind) -> Self {
        kind.into()
    }

    pub fn invalid_expression() -> Self {
        Self::new(FormulaErrorKind::InvalidExpression)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// The short reason reported to the editor (`"invalid expression"`, ...).
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl Error for FormulaError {}

impl From<FormulaError> for FieldValue {
    fn from(error: FormulaError) -> Self {
        FieldValue::Error(error)
    }
}

/// A derived-field dependency cycle.
///
/// `involved_field_ids` lists the fields on the cycle in traversal order,
/// starting from the field where the cycle was entered. A self-reference is a
/// cycle of length one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CycleError {
    pub involved_field_ids: Vec<String>,
}

impl CycleError {
    pub fn new(involved_field_ids: Vec<String>) -> Self {
        Self { involved_field_ids }
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.involved_field_ids.iter().any(|id| id == field_id)
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.involved_field_ids.as_slice() {
            [] => f.write_str("circular dependency"),
            [only] => write!(f, "field `{only}` depends on itself"),
            ids => {
                write!(f, "circular dependency: ")?;
                for id in ids {
                    write!(f, "{id} -> ")?;
                }
                write!(f, "{}", ids[0])
            }
        }
    }
}

impl Error for CycleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_error_display_includes_message() {
        let err = FormulaError::invalid_expression().with_message("unbalanced parentheses");
        assert_eq!(err.to_string(), "invalid expression: unbalanced parentheses");
        assert_eq!(err.reason(), "invalid expression");
    }

    #[test]
    fn cycle_error_display() {
        let single = CycleError::new(vec!["total".into()]);
        assert_eq!(single.to_string(), "field `total` depends on itself");

        let pair = CycleError::new(vec!["a".into(), "b".into()]);
        assert_eq!(pair.to_string(), "circular dependency: a -> b -> a");
        assert!(pair.contains("b"));
        assert!(!pair.contains("c"));
    }
}
