//! Field change events
//!
//! One tagged union for every field kind, dispatched to a single reducer
//! ([`crate::FormState::apply`]).

use serde::{Deserialize, Serialize};

/// Outcome of a file operation, as seen by the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FilesChanged {
    /// The staged list changed; `count` files are staged now
    Accepted {
        /// Staged count after the operation
        count: usize,
    },
    /// The selection was refused; nothing was committed
    Rejected {
        /// Message for the image field
        error: String,
    },
}

/// A change to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldChange {
    /// Text or select field changed
    Text {
        /// Field name
        field: String,
        /// New value
        value: String,
    },
    /// Number field changed (raw entered text)
    Number {
        /// Field name
        field: String,
        /// New raw value
        raw: String,
    },
    /// Checkbox toggled
    Bool {
        /// Field name
        field: String,
        /// New state
        value: bool,
    },
    /// Image field changed
    Files(FilesChanged),
}

impl FieldChange {
    /// Text change
    #[inline]
    #[must_use]
    pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Number change
    #[inline]
    #[must_use]
    pub fn number(field: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Number {
            field: field.into(),
            raw: raw.into(),
        }
    }

    /// Checkbox change
    #[inline]
    #[must_use]
    pub fn bool(field: impl Into<String>, value: bool) -> Self {
        Self::Bool {
            field: field.into(),
            value,
        }
    }

    /// Name of the scalar field this event targets (`None` for files)
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Text { field, .. } | Self::Number { field, .. } | Self::Bool { field, .. } => {
                Some(field)
            }
            Self::Files(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_deserialize_from_tagged_json() {
        let change: FieldChange =
            serde_json::from_str(r#"{"type":"number","field":"price","raw":"11"}"#).unwrap();
        assert_eq!(change, FieldChange::number("price", "11"));
        assert_eq!(change.field(), Some("price"));
    }

    #[test]
    fn files_event_has_no_field() {
        let change = FieldChange::Files(FilesChanged::Accepted { count: 2 });
        assert_eq!(change.field(), None);
    }
}
