//! Field-level validation rules and the values they check.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap()
});

/// E.164: leading `+`, 10 to 15 digits.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").unwrap());

// ═══════════════════════════════════════════════════════════
// Values
// ═══════════════════════════════════════════════════════════

/// A single submitted form value. Dates travel as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    Empty,
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Accepts RFC 3339, `datetime-local` (`YYYY-MM-DDTHH:MM`) and plain dates.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        let s = self.as_text()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// Submitted values keyed by field name.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Flatten any serializable request into form values so typed requests
/// can be checked against the same schema as the interactive form.
pub fn values_from<T: Serialize>(input: &T) -> FormValues {
    let mut values = FormValues::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(input) {
        for (key, value) in map {
            let field = match value {
                serde_json::Value::Null => FieldValue::Empty,
                serde_json::Value::Bool(b) => FieldValue::Bool(b),
                serde_json::Value::String(s) => FieldValue::Text(s),
                other => FieldValue::Text(other.to_string()),
            };
            values.insert(key, field);
        }
    }
    values
}

// ═══════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "options")]
pub enum ValueType {
    Text,
    DateTime,
    Bool,
    /// Text restricted to a fixed set of options.
    Choice(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pattern {
    Email,
    Phone,
}

impl Pattern {
    fn matches(&self, s: &str) -> bool {
        match self {
            Pattern::Email => EMAIL_PATTERN.is_match(s),
            Pattern::Phone => PHONE_PATTERN.is_match(s),
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Pattern::Email => "Invalid email address",
            Pattern::Phone => "Invalid phone number",
        }
    }
}

/// Validation rule attached to one field descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub required: bool,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(default)]
    pub must_be_true: bool,
    /// Overrides the generated message for any failure of this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldRule {
    fn of(value_type: ValueType) -> Self {
        Self {
            required: false,
            value_type,
            min_len: None,
            max_len: None,
            pattern: None,
            must_be_true: false,
            message: None,
        }
    }

    pub fn text() -> Self {
        Self::of(ValueType::Text)
    }

    pub fn datetime() -> Self {
        Self::of(ValueType::DateTime)
    }

    pub fn boolean() -> Self {
        Self::of(ValueType::Bool)
    }

    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(ValueType::Choice(options.into_iter().map(Into::into).collect()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_len = Some(min);
        self.max_len = Some(max);
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Checkbox that has to be ticked. Implies `required`.
    pub fn must_be_true(mut self) -> Self {
        self.required = true;
        self.must_be_true = true;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Check one value. `label` names the field in generated messages.
    pub fn check(&self, label: &str, value: &FieldValue) -> Result<(), String> {
        self.check_inner(label, value)
            .map_err(|generated| self.message.clone().unwrap_or(generated))
    }

    fn check_inner(&self, label: &str, value: &FieldValue) -> Result<(), String> {
        if value.is_empty() {
            return if self.required {
                Err(match self.min_len {
                    Some(min) => format!("{label} must be at least {min} characters"),
                    None => format!("{label} is required"),
                })
            } else {
                Ok(())
            };
        }

        match &self.value_type {
            ValueType::Bool => {
                let checked = value
                    .as_bool()
                    .ok_or_else(|| format!("{label} must be true or false"))?;
                if self.must_be_true && !checked {
                    return Err(format!("{label} must be accepted"));
                }
                Ok(())
            }
            ValueType::DateTime => value
                .as_datetime()
                .map(|_| ())
                .ok_or_else(|| format!("{label} must be a valid date")),
            ValueType::Text => {
                let text = value
                    .as_text()
                    .ok_or_else(|| format!("{label} must be text"))?;
                self.check_text(label, text)
            }
            ValueType::Choice(options) => {
                let text = value
                    .as_text()
                    .ok_or_else(|| format!("{label} must be text"))?;
                if !options.iter().any(|o| o == text) {
                    return Err(format!("{label} must be one of: {}", options.join(", ")));
                }
                Ok(())
            }
        }
    }

    fn check_text(&self, label: &str, text: &str) -> Result<(), String> {
        let len = text.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                return Err(format!("{label} must be at least {min} characters"));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Err(format!("{label} must be at most {max} characters"));
            }
        }
        if let Some(pattern) = self.pattern {
            if !pattern.matches(text) {
                return Err(pattern.message().to_string());
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Field-scoped validation failures (field name → message).
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[error("Validation failed for {} field(s)", .fields.len())]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.into());
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}
