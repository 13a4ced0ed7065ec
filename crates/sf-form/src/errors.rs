//! Per-field error map and form reducer errors

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Error message per field, in insertion order
///
/// Local validation, capacity rejections and backend validation all land
/// here, so the UI has one error-rendering path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    /// Empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message of `field`, replacing any previous one
    pub fn set(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Remove the message of `field`
    pub fn clear(&mut self, field: &str) -> Option<String> {
        self.0.shift_remove(field)
    }

    /// Remove every message
    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    /// Message of `field`
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` has a message
    #[inline]
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Copy every message of `other` over this map
    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    /// Messages in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields with a message
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no messages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Errors from applying a change event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The event names a field the schema does not have
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The event kind does not match the field kind
    #[error("field {field} is a {expected} field")]
    KindMismatch {
        /// Field name
        field: String,
        /// Kind declared by the schema
        expected: &'static str,
    },
}
