use std::fmt::{self, Display};

use crate::{ERROR_SENTINEL_TEXT, FieldType, FormulaError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A runtime value held by one form field.
///
/// Which variant a field carries depends on its [`FieldType`]; editors hand
/// the core whatever their widgets produce and [`FieldValue::coerce_for`]
/// normalizes it at the boundary. `Error` is the sentinel written into a
/// derived field whose formula failed.
///
/// Serialized untagged, so a values map reads as plain JSON
/// (`{"age": "26", "agree": true, "qty": 3}`).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Error(FormulaError),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
            FieldValue::Error(_) => f.write_str(ERROR_SENTINEL_TEXT),
        }
    }
}

/// Render a number the way a form shows it: integral values without a
/// fractional part and negative zero as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Empty value, whitespace-only text, or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FieldValue::Error(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value: numbers, or text that parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
            _ => None,
        }
    }

    /// Normalize an editor-supplied value to the variant expected by a field
    /// of type `ty`.
    ///
    /// Coercion is lenient: values that cannot be converted are kept as-is so
    /// the validation engine still sees what the user typed.
    pub fn coerce_for(self, ty: FieldType) -> FieldValue {
        match (ty, self) {
            (_, v @ FieldValue::Error(_)) => v,
            (_, FieldValue::Empty) => FieldValue::Empty,
            (FieldType::Number, FieldValue::Text(s)) => {
                if s.trim().is_empty() {
                    FieldValue::Empty
                } else {
                    match s.trim().parse::<f64>() {
                        Ok(n) if n.is_finite() => FieldValue::Number(n),
                        _ => FieldValue::Text(s),
                    }
                }
            }
            (FieldType::Checkbox, FieldValue::Text(s)) => {
                let flag = match s.trim() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                };
                flag.map_or(FieldValue::Text(s), FieldValue::Boolean)
            }
            (
                FieldType::Text
                | FieldType::Textarea
                | FieldType::Select
                | FieldType::Radio
                | FieldType::Date,
                FieldValue::Number(n),
            ) => FieldValue::Text(format_number(n)),
            (_, v) => v,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(14.0).to_string(), "14");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Number(-0.0).to_string(), "0");
    }

    #[test]
    fn blank_detection() {
        assert!(FieldValue::Empty.is_blank());
        assert!(FieldValue::text("   ").is_blank());
        assert!(FieldValue::List(vec![]).is_blank());
        assert!(!FieldValue::Boolean(false).is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }

    #[test]
    fn coerce_number_field_parses_text() {
        assert_eq!(
            FieldValue::text(" 42 ").coerce_for(FieldType::Number),
            FieldValue::Number(42.0)
        );
        assert_eq!(
            FieldValue::text("").coerce_for(FieldType::Number),
            FieldValue::Empty
        );
        // Unparseable input is kept so validation can still report on it.
        assert_eq!(
            FieldValue::text("abc").coerce_for(FieldType::Number),
            FieldValue::text("abc")
        );
    }

    #[test]
    fn coerce_checkbox_and_text_fields() {
        assert_eq!(
            FieldValue::text("true").coerce_for(FieldType::Checkbox),
            FieldValue::Boolean(true)
        );
        assert_eq!(
            FieldValue::Number(3.0).coerce_for(FieldType::Text),
            FieldValue::text("3")
        );
        let err = FieldValue::Error(FormulaError::invalid_expression());
        assert_eq!(err.clone().coerce_for(FieldType::Number), err);
    }

    #[test]
    fn error_sentinel_displays_fixed_text() {
        let v: FieldValue = FormulaError::invalid_expression().into();
        assert!(v.is_error());
        assert_eq!(v.to_string(), ERROR_SENTINEL_TEXT);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn untagged_json_shape() {
        let v: FieldValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, FieldValue::Number(3.0));
        let v: FieldValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, FieldValue::Empty);
        let v: FieldValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(v, FieldValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(
            serde_json::to_string(&FieldValue::text("x")).unwrap(),
            r#""x""#
        );
    }
}
