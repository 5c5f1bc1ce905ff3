use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use formsmith_common::{
    ERROR_SENTINEL_TEXT, FieldType, FieldValue, FormulaError, FormulaErrorKind, format_number,
};
use formsmith_parse::{
    ASTNode, ASTNodeType, Parser, TokenSubType, TokenType, Tokenizer, quote_text,
    substitute_references,
};

use crate::engine::EvalConfig;

/// Current value of one parent of a derived field.
#[derive(Debug, Clone, Copy)]
pub struct ParentValue<'a> {
    pub id: &'a str,
    pub field_type: FieldType,
    pub value: &'a FieldValue,
}

impl<'a> ParentValue<'a> {
    pub fn new(id: &'a str, field_type: FieldType, value: &'a FieldValue) -> Self {
        Self {
            id,
            field_type,
            value,
        }
    }

    /// Formula text standing in for this parent's value.
    fn render(&self) -> String {
        match self.value {
            FieldValue::Empty => quote_text(""),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => match self.field_type {
                FieldType::Number => match self.value.as_number() {
                    Some(n) => format_number(n),
                    None => quote_text(s),
                },
                _ => quote_text(s),
            },
            FieldValue::List(items) => {
                let quoted: Vec<String> = items.iter().map(|s| quote_text(s)).collect();
                format!("[{}]", quoted.join(","))
            }
            FieldValue::Error(_) => quote_text(ERROR_SENTINEL_TEXT),
        }
    }
}

/// How a substituted formula is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormulaShape {
    /// Only digits, whitespace, `+ - * / ( ) .`.
    Arithmetic,
    /// String and number literals joined by `+`, with parentheses.
    Concatenation,
    /// Anything else; shown as text.
    Display,
}

/// Evaluates derived-field formulas against their parents' values.
///
/// User text is never executed: a formula is either arithmetic over number
/// literals, a concatenation of literals, the age shorthand, or display text.
pub struct Interpreter<'a> {
    config: &'a EvalConfig,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a EvalConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        formula: &str,
        parents: &[ParentValue<'_>],
    ) -> Result<FieldValue, FormulaError> {
        if formula.trim().is_empty() {
            return Ok(FieldValue::Text(String::new()));
        }
        let len = formula.chars().count();
        if len > self.config.max_formula_len {
            return Err(FormulaError::new(FormulaErrorKind::TooLong).with_message(format!(
                "{len} characters (limit {})",
                self.config.max_formula_len
            )));
        }

        if let [parent] = parents {
            if parent.field_type == FieldType::Date && formula.contains("age") {
                return self.eval_age(parent.value);
            }
        }

        let substituted = substitute_references(formula, parents.iter().map(|p| p.id), |id| {
            parents
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.render())
                .unwrap_or_else(|| quote_text(""))
        });

        match classify(&substituted) {
            FormulaShape::Arithmetic => {
                let ast = parse_expression(&substituted)?;
                self.evaluate_ast(&ast).map(into_display)
            }
            FormulaShape::Concatenation => match parse_expression(&substituted) {
                Ok(ast) => self.evaluate_ast(&ast).map(into_display),
                Err(_) => Ok(FieldValue::Text(substituted)),
            },
            FormulaShape::Display => Ok(FieldValue::Text(substituted)),
        }
    }

    /// Evaluate a parsed expression to a number or text literal.
    pub fn evaluate_ast(&self, node: &ASTNode) -> Result<FieldValue, FormulaError> {
        match &node.node_type {
            ASTNodeType::Literal(value) => Ok(value.clone()),
            ASTNodeType::UnaryOp { op, expr } => {
                let v = self.evaluate_ast(expr)?;
                self.eval_unary(op, v)
            }
            ASTNodeType::BinaryOp { .. } => {
                // Left-associative chains nest on the left; walk that spine iteratively.
                let mut pending = Vec::new();
                let mut cursor = node;
                while let ASTNodeType::BinaryOp { op, left, right } = &cursor.node_type {
                    pending.push((op.as_str(), right.as_ref()));
                    cursor = left.as_ref();
                }
                let mut acc = self.evaluate_ast(cursor)?;
                for (op, right) in pending.into_iter().rev() {
                    let r = self.evaluate_ast(right)?;
                    acc = self.eval_binary(op, acc, r)?;
                }
                Ok(acc)
            }
        }
    }

    fn eval_unary(&self, op: &str, v: FieldValue) -> Result<FieldValue, FormulaError> {
        let n = expect_number(&v, op)?;
        match op {
            "+" => Ok(FieldValue::Number(n)),
            "-" => Ok(FieldValue::Number(-n)),
            _ => Err(FormulaError::invalid_expression()
                .with_message(format!("unsupported unary operator '{op}'"))),
        }
    }

    /* ===================  binary ops  =================== */
    fn eval_binary(
        &self,
        op: &str,
        l: FieldValue,
        r: FieldValue,
    ) -> Result<FieldValue, FormulaError> {
        if op == "+" && (matches!(l, FieldValue::Text(_)) || matches!(r, FieldValue::Text(_))) {
            return Ok(FieldValue::Text(format!("{l}{r}")));
        }

        let a = expect_number(&l, op)?;
        let b = expect_number(&r, op)?;
        let result = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => {
                if b == 0.0 {
                    return Err(
                        FormulaError::invalid_expression().with_message("division by zero")
                    );
                }
                a / b
            }
            _ => {
                return Err(FormulaError::invalid_expression()
                    .with_message(format!("unsupported operator '{op}'")));
            }
        };

        if result.is_finite() {
            Ok(FieldValue::Number(result))
        } else {
            Err(FormulaError::invalid_expression().with_message("result is not a finite number"))
        }
    }

    /// `currentYear - year(parentDate)`.
    fn eval_age(&self, value: &FieldValue) -> Result<FieldValue, FormulaError> {
        let text = match value {
            FieldValue::Empty => return Ok(FieldValue::Text(String::new())),
            FieldValue::Text(s) if s.trim().is_empty() => {
                return Ok(FieldValue::Text(String::new()));
            }
            FieldValue::Text(s) => s.trim(),
            other => {
                return Err(FormulaError::new(FormulaErrorKind::InvalidDate)
                    .with_message(format!("expected a date, found `{other}`")));
            }
        };

        let birth_year = parse_year(text).ok_or_else(|| {
            FormulaError::new(FormulaErrorKind::InvalidDate)
                .with_message(format!("cannot read `{text}` as a date"))
        })?;
        let current_year = self.config.current_year().ok_or_else(|| {
            FormulaError::new(FormulaErrorKind::InvalidDate)
                .with_message("no clock available; enable deterministic mode")
        })?;

        Ok(FieldValue::Text((current_year - birth_year).to_string()))
    }
}

/// Evaluate `formula` with parent values `parents` under `config`.
pub fn evaluate(
    formula: &str,
    parents: &[ParentValue<'_>],
    config: &EvalConfig,
) -> Result<FieldValue, FormulaError> {
    Interpreter::new(config).evaluate(formula, parents)
}

fn classify(text: &str) -> FormulaShape {
    let arithmetic_only = text
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(c));
    if arithmetic_only {
        return FormulaShape::Arithmetic;
    }

    let Ok(tokenizer) = Tokenizer::new(text) else {
        return FormulaShape::Display;
    };
    let mut has_text = false;
    for token in tokenizer.significant() {
        match (token.token_type, token.subtype) {
            (TokenType::Operand, TokenSubType::Text) => has_text = true,
            (TokenType::Operand, TokenSubType::Number) | (TokenType::Paren, _) => {}
            (TokenType::OpInfix, _) if token.value == "+" => {}
            _ => return FormulaShape::Display,
        }
    }
    if has_text {
        FormulaShape::Concatenation
    } else {
        FormulaShape::Display
    }
}

fn parse_expression(text: &str) -> Result<ASTNode, FormulaError> {
    let tokens = Tokenizer::new(text)
        .map_err(|e| FormulaError::invalid_expression().with_message(e.message))?
        .items;
    Parser::new(tokens, false)
        .parse()
        .map_err(|e| FormulaError::invalid_expression().with_message(e.message))
}

fn expect_number(v: &FieldValue, op: &str) -> Result<f64, FormulaError> {
    match v {
        FieldValue::Number(n) => Ok(*n),
        other => Err(FormulaError::invalid_expression()
            .with_message(format!("operator '{op}' needs numbers, found `{other}`"))),
    }
}

/// Derived values are shown as text; numbers lose a trailing `.0`.
fn into_display(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Number(n) => FieldValue::Text(format_number(n)),
        other => other,
    }
}

fn parse_year(text: &str) -> Option<i32> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.year());
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.year())
}
