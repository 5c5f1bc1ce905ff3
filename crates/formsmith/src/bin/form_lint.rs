use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use formsmith_eval::{DependencyGraph, GraphError};
use formsmith_schema::{FormSchema, SavedForm, SchemaIssue, schema_json};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "form-lint",
    about = "Check form definitions for structural problems and circular dependencies"
)]
struct Cli {
    /// Form schema (JSON or YAML) or a saved-forms JSON array.
    #[arg(required_unless_present = "schema")]
    input: Option<PathBuf>,

    /// Print the JSON Schema of the saved-forms file and exit.
    #[arg(long)]
    schema: bool,

    /// Write the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Also print the evaluation order of derived fields.
    #[arg(long)]
    order: bool,
}

#[derive(Debug, Serialize)]
struct FormReport {
    id: String,
    name: String,
    issues: Vec<SchemaIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation_order: Option<Vec<String>>,
}

impl FormReport {
    fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

fn main() -> Result<()> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.schema {
        println!("{}", schema_json());
        return Ok(());
    }
    let Some(input) = cli.input.as_deref() else {
        bail!("no input file given");
    };

    let forms = read_forms(input)?;
    let reports: Vec<FormReport> = forms.iter().map(lint_form).collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_text(&reports, cli.order);
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        bail!("{failed} of {} form(s) failed lint", reports.len());
    }
    Ok(())
}

fn read_forms(path: &Path) -> Result<Vec<FormSchema>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        let schema = FormSchema::from_yaml_str(&text)
            .with_context(|| format!("failed to parse YAML form: {}", path.display()))?;
        return Ok(vec![schema]);
    }

    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
    if value.is_array() {
        let saved: Vec<SavedForm> = serde_json::from_value(value)
            .with_context(|| format!("not a saved-forms array: {}", path.display()))?;
        Ok(saved.into_iter().map(FormSchema::from).collect())
    } else {
        let schema: FormSchema = serde_json::from_value(value)
            .with_context(|| format!("not a form schema: {}", path.display()))?;
        Ok(vec![schema])
    }
}

fn lint_form(schema: &FormSchema) -> FormReport {
    let mut issues = match schema.validate() {
        Ok(()) => Vec::new(),
        Err(err) => err.into_issues(),
    };

    let evaluation_order = match DependencyGraph::build(schema) {
        Ok(graph) => Some(
            graph
                .topological_order()
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
        Err(GraphError::Cycle(cycle)) => {
            issues.push(SchemaIssue::new("fields", cycle.to_string()));
            None
        }
        // Unknown parents are already reported by the schema lint; look for
        // cycles among the parents that do exist.
        Err(GraphError::UnknownParent { .. }) => {
            if let Err(GraphError::Cycle(cycle)) =
                DependencyGraph::build(&without_unknown_parents(schema))
            {
                issues.push(SchemaIssue::new("fields", cycle.to_string()));
            }
            None
        }
    };

    FormReport {
        id: schema.id.clone(),
        name: schema.name.clone(),
        issues,
        evaluation_order,
    }
}

fn without_unknown_parents(schema: &FormSchema) -> FormSchema {
    let mut pruned = schema.clone();
    let known: HashSet<String> = schema.fields.iter().map(|f| f.id.clone()).collect();
    for field in &mut pruned.fields {
        if let Some(derived) = field.derived.as_mut() {
            derived.parent_fields.retain(|id| known.contains(id));
        }
    }
    pruned
}

fn print_text(reports: &[FormReport], show_order: bool) {
    for report in reports {
        let title = if report.name.is_empty() {
            report.id.as_str()
        } else {
            report.name.as_str()
        };
        if report.passed() {
            println!("ok    {title}");
        } else {
            println!("FAIL  {title}");
            for issue in &report.issues {
                println!("  - {issue}");
            }
        }
        if show_order {
            if let Some(order) = &report.evaluation_order {
                println!("  order: {}", order.join(" -> "));
            }
        }
    }
}
