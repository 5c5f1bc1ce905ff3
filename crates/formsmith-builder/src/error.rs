use formsmith_common::FieldType;
use formsmith_eval::GraphError;
use formsmith_schema::RuleKind;
use formsmith_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("no field with id `{0}`")]
    UnknownField(String),
    #[error("field `{0}` is derived and cannot be edited")]
    DerivedField(String),
    #[error("rule `{kind}` does not apply to {field_type} fields")]
    RuleNotApplicable { kind: RuleKind, field_type: FieldType },
    #[error("validation rule needs a message")]
    EmptyRuleMessage,
    #[error("form name must not be blank")]
    BlankName,
    #[error("no clock available; configure a deterministic timestamp")]
    NoClock,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
