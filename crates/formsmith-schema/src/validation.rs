use std::fmt;

use serde::Serialize;

/// A single problem found while linting a form schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Location in the wire representation (`fields[2].derived.parentFields[0]`).
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found by [`FormSchema::validate`](crate::FormSchema::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    issues: Vec<SchemaIssue>,
}

impl SchemaError {
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<SchemaIssue> {
        self.issues
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "form schema has {} issue(s):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}
