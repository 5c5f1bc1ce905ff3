use crate::{EvalConfig, FieldValue, FormulaError};

/// Evaluate a formula that has no parent fields.
///
/// This helper is intended for documentation examples to avoid repetitive setup.
///
/// # Example
///
/// ```rust
/// # use formsmith::doc_examples::eval_standalone;
/// let value = eval_standalone("(2 + 3) * 4")?;
/// assert_eq!(value, formsmith::FieldValue::text("20"));
/// # Ok::<(), formsmith::FormulaError>(())
/// ```
pub fn eval_standalone(formula: &str) -> Result<FieldValue, FormulaError> {
    formsmith_eval::evaluate(formula, &[], &EvalConfig::default())
}
