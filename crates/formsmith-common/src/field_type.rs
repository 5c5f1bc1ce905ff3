use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The input kind of a form field.
///
/// Serialized in lowercase (`"text"`, `"checkbox"`, ...) to match saved form
/// definitions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FieldType {
    Text,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Date,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "textarea" => Some(Self::Textarea),
            "select" => Some(Self::Select),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
        }
    }

    /// Fields that carry an option list (`select` and `radio`).
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Fields whose values are free text (length/email/password rules apply).
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea)
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(FieldType::parse(" Checkbox "), Some(FieldType::Checkbox));
        assert_eq!(FieldType::parse("textarea"), Some(FieldType::Textarea));
        assert_eq!(FieldType::parse("slider"), None);
        for ty in FieldType::ALL {
            assert_eq!(FieldType::parse(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn choice_and_text_classes() {
        assert!(FieldType::Select.has_options());
        assert!(FieldType::Radio.has_options());
        assert!(!FieldType::Checkbox.has_options());
        assert!(FieldType::Textarea.is_textual());
        assert!(!FieldType::Number.is_textual());
    }
}
