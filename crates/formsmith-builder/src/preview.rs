use std::collections::BTreeMap;

use formsmith_common::{FieldValue, FormulaError};
use formsmith_eval::{
    DependencyGraph, EvalConfig, ValidationResultMap, ValuesMap, initial_values,
    recompute_with_config, validate_form,
};
use formsmith_schema::FormSchema;

use crate::BuilderError;

/// A form being filled in.
///
/// Holds the current values, keeps derived fields up to date as inputs change
/// and remembers which fields failed validation on the last submit.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    schema: FormSchema,
    graph: DependencyGraph,
    config: EvalConfig,
    values: ValuesMap,
    formula_errors: BTreeMap<String, FormulaError>,
    validation_errors: ValidationResultMap,
}

impl PreviewSession {
    /// Seed values from defaults and compute every derived field.
    ///
    /// Fails with [`BuilderError::Graph`] when the schema has a cycle or a
    /// derived field names an unknown parent.
    pub fn new(schema: FormSchema, config: EvalConfig) -> Result<Self, BuilderError> {
        let graph = DependencyGraph::build(&schema)?;
        let seeded = initial_values(&schema);
        let result = recompute_with_config(&schema, &graph, &seeded, None, &config);
        Ok(Self {
            schema,
            graph,
            config,
            values: result.values,
            formula_errors: result.errors,
            validation_errors: ValidationResultMap::new(),
        })
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn values(&self) -> &ValuesMap {
        &self.values
    }

    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Derived fields whose formula currently fails.
    pub fn formula_errors(&self) -> &BTreeMap<String, FormulaError> {
        &self.formula_errors
    }

    /// Failing outcomes from the last submit, minus fields edited since.
    pub fn validation_errors(&self) -> &ValidationResultMap {
        &self.validation_errors
    }

    /// Set an input value and recompute what depends on it.
    ///
    /// Returns the formula errors raised by this recomputation.
    pub fn set_value(
        &mut self,
        id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<BTreeMap<String, FormulaError>, BuilderError> {
        let field = self
            .schema
            .field(id)
            .ok_or_else(|| BuilderError::UnknownField(id.to_string()))?;
        if field.is_derived() {
            return Err(BuilderError::DerivedField(id.to_string()));
        }

        self.values
            .insert(id.to_string(), value.into().coerce_for(field.field_type));
        let result =
            recompute_with_config(&self.schema, &self.graph, &self.values, Some(id), &self.config);

        for target in self.graph.affected_by(id) {
            self.formula_errors.remove(target);
        }
        self.formula_errors
            .extend(result.errors.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.values = result.values;
        self.validation_errors.remove(id);
        Ok(result.errors)
    }

    /// Validate every input. On success returns the submitted values,
    /// otherwise the failing outcomes, which are also kept on the session.
    pub fn submit(&mut self) -> Result<ValuesMap, ValidationResultMap> {
        let failing: ValidationResultMap = validate_form(&self.schema, &self.values)
            .into_iter()
            .filter(|(_, outcome)| !outcome.valid)
            .collect();
        self.validation_errors = failing.clone();
        if failing.is_empty() {
            Ok(self.values.clone())
        } else {
            Err(failing)
        }
    }

    /// Back to default values.
    pub fn reset(&mut self) {
        let seeded = initial_values(&self.schema);
        let result = recompute_with_config(&self.schema, &self.graph, &seeded, None, &self.config);
        self.values = result.values;
        self.formula_errors = result.errors;
        self.validation_errors.clear();
    }
}
