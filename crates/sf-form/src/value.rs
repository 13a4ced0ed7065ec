//! Field values
//!
//! Numbers are kept exactly as entered so the payload carries the user's
//! text; comparisons and checks parse on demand.

use crate::schema::{FieldKind, FormSchema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current value of one scalar field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Text or select value
    Text(String),
    /// Numeric input, raw text
    Number(String),
    /// Checkbox state
    Bool(bool),
}

impl FieldValue {
    /// Empty value for a field kind
    #[must_use]
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Select { .. } => Self::Text(String::new()),
            FieldKind::Number => Self::Number(String::new()),
            FieldKind::Bool => Self::Bool(false),
        }
    }

    /// Convert a fetched record value into a field value of `kind`
    ///
    /// `null` becomes the kind's empty value. Booleans follow truthiness,
    /// except that the strings `"false"` and `"0"` (multipart echoes) are
    /// false.
    #[must_use]
    pub fn from_json(kind: &FieldKind, value: &Value) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Select { .. } => Self::Text(json_text(value)),
            FieldKind::Number => Self::Number(match value {
                Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
                other => json_text(other),
            }),
            FieldKind::Bool => Self::Bool(json_truthy(value)),
        }
    }

    /// Numeric value: blank is `0`, unparsable is `None`
    #[must_use]
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Text(raw) | Self::Number(raw) => parse_number(raw),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    /// Truthiness
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(raw) => !raw.is_empty(),
            Self::Number(raw) => parse_number(raw).is_some_and(|n| n != 0.0),
        }
    }

    /// Raw text form (`true`/`false` for booleans)
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(raw) | Self::Number(raw) => raw.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Whether the value is blank after trimming (booleans never are)
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(raw) | Self::Number(raw) => raw.trim().is_empty(),
            Self::Bool(_) => false,
        }
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "false" | "0"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Values of every scalar field, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(IndexMap<String, FieldValue>);

impl FieldValues {
    /// Empty values for every field of `schema`
    #[must_use]
    pub fn defaults(schema: &FormSchema) -> Self {
        Self(
            schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), FieldValue::default_for(&f.kind)))
                .collect(),
        )
    }

    /// Values read from a fetched record; missing fields get defaults
    #[must_use]
    pub fn from_record(schema: &FormSchema, record: &serde_json::Map<String, Value>) -> Self {
        Self(
            schema
                .fields()
                .iter()
                .map(|f| {
                    let value = record
                        .get(&f.name)
                        .map_or_else(|| FieldValue::default_for(&f.kind), |v| {
                            FieldValue::from_json(&f.kind, v)
                        });
                    (f.name.clone(), value)
                })
                .collect(),
        )
    }

    /// Value of `field`
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Text of a text, select or number field
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field)? {
            FieldValue::Text(raw) | FieldValue::Number(raw) => Some(raw),
            FieldValue::Bool(_) => None,
        }
    }

    /// Replace the value of `field`
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    /// Values in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
