use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use formsmith_common::{FieldType, FieldValue};
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::validation::{SchemaError, SchemaIssue};

/// A form definition: an ordered list of fields under a name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "Formsmith form schema",
    description = "Ordered list of typed fields, their validation rules, option lists and derived-field formulas."
)]
pub struct FormSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FormSchema {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields,
        }
    }

    /// Construct a schema from a JSON string slice.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Construct a schema from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Fields whose values are computed from a formula, in field order.
    pub fn derived_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_derived())
    }

    /// Normalize the schema in-place.
    ///
    /// - Labels and the form name are trimmed.
    /// - Parent lists keep the first occurrence of each id.
    /// - Option labels and values are trimmed.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        for field in &mut self.fields {
            field.label = field.label.trim().to_string();
            if let Some(options) = &mut field.options {
                for opt in options.iter_mut() {
                    opt.label = opt.label.trim().to_string();
                    opt.value = opt.value.trim().to_string();
                }
            }
            if let Some(derived) = &mut field.derived {
                let mut seen = HashSet::new();
                derived.parent_fields.retain(|id| seen.insert(id.clone()));
            }
        }
    }

    /// Return a normalized copy of the schema.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Lint the schema and return granular issues when invariants fail.
    ///
    /// Cycles are not detected here; building the dependency graph reports them.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut issues = Vec::new();
        let ids: HashSet<&str> = self.fields.iter().map(|f| f.id.as_str()).collect();
        let mut seen_ids = HashSet::new();

        for (idx, field) in self.fields.iter().enumerate() {
            let path = format!("fields[{idx}]");

            if field.id.trim().is_empty() {
                issues.push(SchemaIssue::new(
                    format!("{path}.id"),
                    "field id must not be empty",
                ));
            } else if !seen_ids.insert(field.id.as_str()) {
                issues.push(SchemaIssue::new(
                    format!("{path}.id"),
                    format!("duplicate field id `{}`", field.id),
                ));
            }

            if let Some(options) = &field.options {
                if !field.field_type.has_options() && !options.is_empty() {
                    issues.push(SchemaIssue::new(
                        format!("{path}.options"),
                        format!("`{}` fields do not take options", field.field_type),
                    ));
                }
                let mut seen_values = HashSet::new();
                for (opt_idx, opt) in options.iter().enumerate() {
                    if !seen_values.insert(opt.value.as_str()) {
                        issues.push(SchemaIssue::new(
                            format!("{path}.options[{opt_idx}].value"),
                            format!("duplicate option value `{}`", opt.value),
                        ));
                    }
                }
            }

            for (rule_idx, rule) in field.validation_rules.iter().enumerate() {
                let rule_path = format!("{path}.validationRules[{rule_idx}]");
                if !rule.kind.applies_to(field.field_type) {
                    issues.push(SchemaIssue::new(
                        format!("{rule_path}.type"),
                        format!(
                            "rule `{}` does not apply to `{}` fields",
                            rule.kind, field.field_type
                        ),
                    ));
                }
                if rule.kind.takes_bound() {
                    match rule.bound {
                        None => issues.push(SchemaIssue::new(
                            format!("{rule_path}.value"),
                            format!("rule `{}` requires a numeric bound", rule.kind),
                        )),
                        Some(b) if b < 0.0 => issues.push(SchemaIssue::new(
                            format!("{rule_path}.value"),
                            "bound must not be negative",
                        )),
                        _ => {}
                    }
                }
            }

            if let Some(derived) = field.derived.as_ref().filter(|d| d.is_derived) {
                for (p_idx, parent) in derived.parent_fields.iter().enumerate() {
                    let p_path = format!("{path}.derived.parentFields[{p_idx}]");
                    if parent == &field.id {
                        issues.push(SchemaIssue::new(
                            p_path,
                            format!("field `{}` cannot depend on itself", field.id),
                        ));
                    } else if !ids.contains(parent.as_str()) {
                        issues.push(SchemaIssue::new(
                            p_path,
                            format!("unknown parent field `{parent}`"),
                        ));
                    }
                }
            }

            let default_ok = match (&field.default_value, field.field_type) {
                (DefaultValue::Bool(_), FieldType::Checkbox) => true,
                (DefaultValue::Text(s), FieldType::Checkbox) => s.is_empty(),
                (DefaultValue::List(_), FieldType::Checkbox) => false,
                (DefaultValue::Bool(_), _) => false,
                _ => true,
            };
            if !default_ok {
                issues.push(SchemaIssue::new(
                    format!("{path}.defaultValue"),
                    if field.field_type == FieldType::Checkbox {
                        "checkbox fields expect a boolean default".to_string()
                    } else {
                        format!(
                            "`{}` fields expect a text or list default",
                            field.field_type
                        )
                    },
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(issues))
        }
    }
}

impl std::str::FromStr for FormSchema {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormSchema::from_json_str(s)
    }
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique, stable, opaque identifier.
    pub id: String,
    #[serde(rename = "type")]
    #[schemars(schema_with = "field_type_schema")]
    pub field_type: FieldType,
    /// Display name; never used by logic other than messages.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: DefaultValue,
    /// Ordered; the first failing rule wins.
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
    /// Only meaningful for `select` and `radio`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedSpec>,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            required: false,
            default_value: DefaultValue::default(),
            validation_rules: Vec::new(),
            options: None,
            derived: None,
        }
    }

    pub fn is_derived(&self) -> bool {
        self.derived.as_ref().is_some_and(|d| d.is_derived)
    }

    /// Parents of a derived field; empty for ordinary fields.
    pub fn parent_ids(&self) -> &[String] {
        match &self.derived {
            Some(d) if d.is_derived => &d.parent_fields,
            _ => &[],
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.derived {
            Some(d) if d.is_derived => Some(d.formula.as_str()),
            _ => None,
        }
    }

    /// The field's starting value, coerced to its type.
    pub fn initial_value(&self) -> FieldValue {
        self.default_value.to_field_value(self.field_type)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_formula<I, S>(mut self, parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derived = Some(DerivedSpec {
            is_derived: true,
            parent_fields: parents.into_iter().map(Into::into).collect(),
            formula: formula.into(),
        });
        self
    }
}

fn field_type_schema(_gen: &mut SchemaGenerator) -> Schema {
    let names: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
    json_schema!({
        "type": "string",
        "enum": names,
    })
}

/// A field's configured starting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl Default for DefaultValue {
    fn default() -> Self {
        DefaultValue::Text(String::new())
    }
}

impl DefaultValue {
    pub fn to_field_value(&self, ty: FieldType) -> FieldValue {
        match self {
            DefaultValue::Bool(b) => FieldValue::Boolean(*b),
            DefaultValue::Text(s) => FieldValue::Text(s.clone()).coerce_for(ty),
            DefaultValue::List(items) => FieldValue::List(items.clone()),
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Bool(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Text(value)
    }
}

impl From<Vec<String>> for DefaultValue {
    fn from(value: Vec<String>) -> Self {
        DefaultValue::List(value)
    }
}

/// Option of a `select` or `radio` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Formula configuration of a derived field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSpec {
    #[serde(default)]
    pub is_derived: bool,
    #[serde(default)]
    pub parent_fields: Vec<String>,
    #[serde(default)]
    pub formula: String,
}

/// Kind of a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Email,
    Password,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Required,
        RuleKind::MinLength,
        RuleKind::MaxLength,
        RuleKind::Email,
        RuleKind::Password,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::MinLength => "minLength",
            RuleKind::MaxLength => "maxLength",
            RuleKind::Email => "email",
            RuleKind::Password => "password",
        }
    }

    /// `required` applies to every field type; the others only to free text.
    pub fn applies_to(&self, ty: FieldType) -> bool {
        match self {
            RuleKind::Required => true,
            _ => ty.is_textual(),
        }
    }

    pub fn takes_bound(&self) -> bool {
        matches!(self, RuleKind::MinLength | RuleKind::MaxLength)
    }

    /// Rule kinds offered for a field of type `ty`.
    pub fn available_for(ty: FieldType) -> impl Iterator<Item = RuleKind> {
        Self::ALL.into_iter().filter(move |k| k.applies_to(ty))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation rule attached to a field.
///
/// Persisted as `{"type": "minLength", "value": 5, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    #[serde(rename = "type", alias = "kind")]
    pub kind: RuleKind,
    /// Length bound for `minLength`/`maxLength`; ignored otherwise.
    #[serde(
        rename = "value",
        alias = "bound",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_bound",
        deserialize_with = "deserialize_bound"
    )]
    #[schemars(with = "Option<f64>")]
    pub bound: Option<f64>,
    #[serde(default)]
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            bound: None,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, message)
    }

    pub fn min_length(bound: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MinLength, message).with_bound(bound as f64)
    }

    pub fn max_length(bound: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MaxLength, message).with_bound(bound as f64)
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Email, message)
    }

    pub fn password(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Password, message)
    }

    pub fn with_bound(mut self, bound: f64) -> Self {
        self.bound = Some(bound);
        self
    }
}

/// Whole bounds are written as integers, so `5` stays `5` rather than `5.0`.
fn serialize_bound<S>(bound: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *bound {
        Some(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => serializer.serialize_some(&(v as i64)),
        Some(v) => serializer.serialize_some(&v),
        None => serializer.serialize_none(),
    }
}

/// Accepts a number, a numeric string (`"5"`), or null.
fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct BoundVisitor;

    impl<'de> Visitor<'de> for BoundVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid rule bound `{v}`")))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(BoundVisitor)
        }
    }

    deserializer.deserialize_any(BoundVisitor)
}

/// An immutable, timestamped snapshot of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedForm {
    pub id: String,
    pub name: String,
    pub fields: Vec<Field>,
    pub created_at: Timestamp,
}

impl SavedForm {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<Field>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields,
            created_at,
        }
    }

    /// The form definition captured by this snapshot.
    pub fn schema(&self) -> FormSchema {
        FormSchema::new(self.id.clone(), self.name.clone(), self.fields.clone())
    }
}

impl From<SavedForm> for FormSchema {
    fn from(saved: SavedForm) -> Self {
        FormSchema::new(saved.id, saved.name, saved.fields)
    }
}

/// UTC instant serialized as RFC 3339 with millisecond precision
/// (`2024-05-01T09:30:00.000Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("RFC 3339 timestamp (e.g. 2024-05-01T09:30:00.000Z)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                DateTime::parse_from_rfc3339(v)
                    .map(|dt| Timestamp(dt.with_timezone(&Utc)))
                    .map_err(|err| de::Error::custom(format!("invalid createdAt: {err}")))
            }
        }

        deserializer.deserialize_str(TimestampVisitor)
    }
}

impl JsonSchema for Timestamp {
    fn schema_name() -> Cow<'static, str> {
        "Timestamp".into()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "format": "date-time",
        })
    }
}

#[cfg(test)]
pub(crate) mod example_data {
    use super::*;

    /// Two inputs and a derived sum, with a few rules.
    pub fn order_form_example() -> FormSchema {
        serde_json::from_value(serde_json::json!({
            "id": "order",
            "name": "Order",
            "fields": [
                {
                    "id": "qty",
                    "type": "number",
                    "label": "Quantity",
                    "required": true,
                    "defaultValue": "1",
                    "validationRules": []
                },
                {
                    "id": "price",
                    "type": "number",
                    "label": "Unit price",
                    "required": false,
                    "defaultValue": "",
                    "validationRules": []
                },
                {
                    "id": "total",
                    "type": "number",
                    "label": "Total",
                    "required": false,
                    "defaultValue": "",
                    "validationRules": [],
                    "derived": {
                        "isDerived": true,
                        "parentFields": ["qty", "price"],
                        "formula": "qty * price"
                    }
                },
                {
                    "id": "email",
                    "type": "text",
                    "label": "Email",
                    "required": true,
                    "defaultValue": "",
                    "validationRules": [
                        {"type": "email", "message": "Enter a valid email"}
                    ]
                }
            ]
        }))
        .unwrap_or_default()
    }
}
