use formsmith_common::FieldType;
use formsmith_eval::EvalConfig;
use formsmith_schema::{
    DefaultValue, DerivedSpec, Field, FormSchema, SavedForm, SchemaError, SelectOption, Timestamp,
    ValidationRule,
};
use formsmith_store::FormStore;

use crate::clock;
use crate::{BuilderError, PreviewSession};

#[derive(Clone, Debug, Default)]
pub struct BuilderConfig {
    pub eval: EvalConfig,
}

impl BuilderConfig {
    /// Frozen clock for ids, timestamps and date formulas.
    pub fn deterministic(timestamp_utc: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            eval: EvalConfig::deterministic(timestamp_utc),
        }
    }
}

/// Partial update for [`FormBuilder::update_field`]. `None` leaves the
/// attribute unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPatch {
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub required: Option<bool>,
    pub default_value: Option<DefaultValue>,
    pub validation_rules: Option<Vec<ValidationRule>>,
    pub options: Option<Option<Vec<SelectOption>>>,
    pub derived: Option<Option<DerivedSpec>>,
}

impl FieldPatch {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn field_type(mut self, ty: FieldType) -> Self {
        self.field_type = Some(ty);
        self
    }

    /// Turn the field into a derived one.
    pub fn derived<I, S>(mut self, parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derived = Some(Some(DerivedSpec {
            is_derived: true,
            parent_fields: parents.into_iter().map(Into::into).collect(),
            formula: formula.into(),
        }));
        self
    }

    fn apply(self, field: &mut Field) {
        if let Some(ty) = self.field_type {
            field.field_type = ty;
        }
        if let Some(label) = self.label {
            field.label = label;
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(default_value) = self.default_value {
            field.default_value = default_value;
        }
        if let Some(rules) = self.validation_rules {
            field.validation_rules = rules;
        }
        if let Some(options) = self.options {
            field.options = options;
        }
        if let Some(derived) = self.derived {
            field.derived = derived;
        }
    }
}

/// The form currently being designed.
#[derive(Clone, Debug, Default)]
pub struct FormBuilder {
    name: String,
    fields: Vec<Field>,
    /// Id of the saved form this draft was loaded from.
    source_id: Option<String>,
    config: BuilderConfig,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    fn field_mut(&mut self, id: &str) -> Result<&mut Field, BuilderError> {
        self.fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| BuilderError::UnknownField(id.to_string()))
    }

    /// Current draft as a schema.
    pub fn schema(&self) -> FormSchema {
        FormSchema::new(
            self.source_id.clone().unwrap_or_default(),
            self.name.clone(),
            self.fields.clone(),
        )
    }

    /// Structural problems in the current draft.
    pub fn lint(&self) -> Result<(), SchemaError> {
        self.schema().validate()
    }

    /// Append a field of `field_type` with editor defaults and return its id.
    pub fn add_field(&mut self, field_type: FieldType) -> Result<String, BuilderError> {
        let now = clock::now(&self.config.eval)?;
        let id = clock::unique_id(now, |id| self.fields.iter().any(|f| f.id == id));

        let mut field = Field::new(id.clone(), field_type, format!("New {field_type} field"));
        field.default_value = match field_type {
            FieldType::Checkbox => DefaultValue::Bool(false),
            _ => DefaultValue::Text(String::new()),
        };
        if field_type.has_options() {
            field.options = Some(vec![SelectOption::new("Option 1", "option1")]);
        }
        field.derived = Some(DerivedSpec::default());

        self.fields.push(field);
        Ok(id)
    }

    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> Result<(), BuilderError> {
        patch.apply(self.field_mut(id)?);
        Ok(())
    }

    /// Remove a field and drop it from every derived field's parents.
    pub fn delete_field(&mut self, id: &str) -> Result<Field, BuilderError> {
        let pos = self
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| BuilderError::UnknownField(id.to_string()))?;
        let removed = self.fields.remove(pos);
        for field in &mut self.fields {
            if let Some(derived) = field.derived.as_mut() {
                derived.parent_fields.retain(|p| p != id);
            }
        }
        Ok(removed)
    }

    /// Move the field at `from` to `to`. Returns `false` and changes nothing
    /// when either index is out of range.
    pub fn reorder_fields(&mut self, from: usize, to: usize) -> bool {
        let len = self.fields.len();
        if from >= len || to >= len {
            return false;
        }
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
        true
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Start over with an empty, unnamed form.
    pub fn clear(&mut self) {
        self.name.clear();
        self.fields.clear();
        self.source_id = None;
    }

    /// Replace a field's options, dropping entries with a blank label or value.
    pub fn set_options(
        &mut self,
        id: &str,
        options: impl IntoIterator<Item = SelectOption>,
    ) -> Result<(), BuilderError> {
        let field = self.field_mut(id)?;
        field.options = Some(
            options
                .into_iter()
                .filter(|o| !o.label.trim().is_empty() && !o.value.trim().is_empty())
                .collect(),
        );
        Ok(())
    }

    pub fn add_rule(&mut self, id: &str, rule: ValidationRule) -> Result<(), BuilderError> {
        let field = self.field_mut(id)?;
        if !rule.kind.applies_to(field.field_type) {
            return Err(BuilderError::RuleNotApplicable {
                kind: rule.kind,
                field_type: field.field_type,
            });
        }
        if rule.message.trim().is_empty() {
            return Err(BuilderError::EmptyRuleMessage);
        }
        field.validation_rules.push(rule);
        Ok(())
    }

    /// Remove the rule at `index`; `None` when there is no such rule.
    pub fn remove_rule(
        &mut self,
        id: &str,
        index: usize,
    ) -> Result<Option<ValidationRule>, BuilderError> {
        let field = self.field_mut(id)?;
        if index < field.validation_rules.len() {
            Ok(Some(field.validation_rules.remove(index)))
        } else {
            Ok(None)
        }
    }

    /// Snapshot the current fields into `store` under `name`.
    pub fn save(&self, store: &dyn FormStore, name: &str) -> Result<SavedForm, BuilderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BuilderError::BlankName);
        }
        let now = clock::now(&self.config.eval)?;
        let existing = store.list()?;
        let id = clock::unique_id(now, |id| existing.iter().any(|f| f.id == id));

        let form = SavedForm::new(id, name, self.fields.clone(), Timestamp::new(now));
        store.save(form.clone())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(form = %form.id, fields = form.fields.len(), "saved form");
        Ok(form)
    }

    /// Replace the draft with the saved form `id`.
    pub fn load(&mut self, store: &dyn FormStore, id: &str) -> Result<(), BuilderError> {
        let form = store
            .get(id)?
            .ok_or_else(|| formsmith_store::StoreError::NotFound(id.to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(form = %form.id, "loaded form");

        self.name = form.name;
        self.fields = form.fields;
        self.source_id = Some(form.id);
        Ok(())
    }

    /// Start a preview of the current draft.
    pub fn preview(&self) -> Result<PreviewSession, BuilderError> {
        PreviewSession::new(self.schema(), self.config.eval.clone())
    }
}
