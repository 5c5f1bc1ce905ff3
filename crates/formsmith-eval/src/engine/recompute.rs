use std::collections::BTreeMap;

use formsmith_common::{FieldType, FieldValue, FormulaError};
use formsmith_schema::FormSchema;
use smallvec::SmallVec;

use super::{DependencyGraph, EvalConfig};
use crate::interpreter::{Interpreter, ParentValue};

/// Field id -> current value.
pub type ValuesMap = BTreeMap<String, FieldValue>;

/// Result of one recomputation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recomputation {
    pub values: ValuesMap,
    /// Derived fields whose formula failed during this pass.
    pub errors: BTreeMap<String, FormulaError>,
}

impl Recomputation {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Starting values: each non-derived field's default, coerced to its type.
pub fn initial_values(schema: &FormSchema) -> ValuesMap {
    schema
        .fields
        .iter()
        .filter(|f| !f.is_derived())
        .map(|f| (f.id.clone(), f.initial_value()))
        .collect()
}

/// Recompute derived values with the default configuration.
///
/// See [`recompute_with_config`].
pub fn recompute(
    schema: &FormSchema,
    graph: &DependencyGraph,
    current: &ValuesMap,
    changed_field_id: Option<&str>,
) -> Recomputation {
    recompute_with_config(
        schema,
        graph,
        current,
        changed_field_id,
        &EvalConfig::default(),
    )
}

/// Recompute derived values.
///
/// Without `changed_field_id` every derived field is evaluated; with it, only
/// the derived fields that transitively read it. Fields are visited in
/// topological order, so each formula sees its parents' fresh values. A
/// failing formula stores the error sentinel and evaluation continues.
pub fn recompute_with_config(
    schema: &FormSchema,
    graph: &DependencyGraph,
    current: &ValuesMap,
    changed_field_id: Option<&str>,
    config: &EvalConfig,
) -> Recomputation {
    let targets = match changed_field_id {
        Some(id) => graph.affected_by(id),
        None => graph.topological_order(),
    };

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("recompute", targets = targets.len()).entered();

    let interpreter = Interpreter::new(config);
    let mut values = current.clone();
    let mut errors = BTreeMap::new();
    let empty = FieldValue::Empty;

    for id in targets {
        let Some(field) = schema.field(id) else {
            continue;
        };
        let formula = field.formula().unwrap_or_default();

        let result = {
            let parents: SmallVec<[ParentValue<'_>; 4]> = field
                .parent_ids()
                .iter()
                .map(|pid| {
                    let field_type = schema
                        .field(pid)
                        .map(|p| p.field_type)
                        .unwrap_or(FieldType::Text);
                    ParentValue::new(pid, field_type, values.get(pid).unwrap_or(&empty))
                })
                .collect();
            interpreter.evaluate(formula, &parents)
        };

        match result {
            Ok(value) => {
                values.insert(field.id.clone(), value);
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(field = %field.id, error = %err, "formula failed");
                values.insert(field.id.clone(), FieldValue::Error(err.clone()));
                errors.insert(field.id.clone(), err);
            }
        }
    }

    Recomputation { values, errors }
}
