//! Form state and its single change reducer

use crate::errors::{FieldErrors, FormError};
use crate::event::{FieldChange, FilesChanged};
use crate::schema::{FieldKind, FormSchema};
use crate::snapshot::FormSnapshot;
use crate::value::{FieldValue, FieldValues};

/// Current field values and per-field errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: FieldValues,
    errors: FieldErrors,
}

impl FormState {
    /// Start from the snapshot's values with no errors
    #[must_use]
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        Self {
            values: snapshot.values().clone(),
            errors: FieldErrors::new(),
        }
    }

    /// Apply one change event
    ///
    /// Scalar changes replace the value and clear that field's error. An
    /// accepted file change clears the image field's error; a rejected one
    /// sets it and commits nothing else.
    ///
    /// # Errors
    /// - `FormError::UnknownField` if the schema has no such field
    /// - `FormError::KindMismatch` if the event kind does not fit the field
    pub fn apply(&mut self, schema: &FormSchema, change: FieldChange) -> Result<(), FormError> {
        match change {
            FieldChange::Text { field, value } => {
                self.expect_kind(schema, &field, |k| {
                    matches!(k, FieldKind::Text | FieldKind::Select { .. })
                })?;
                self.commit(field, FieldValue::Text(value));
            }
            FieldChange::Number { field, raw } => {
                self.expect_kind(schema, &field, |k| matches!(k, FieldKind::Number))?;
                self.commit(field, FieldValue::Number(raw));
            }
            FieldChange::Bool { field, value } => {
                self.expect_kind(schema, &field, |k| matches!(k, FieldKind::Bool))?;
                self.commit(field, FieldValue::Bool(value));
            }
            FieldChange::Files(FilesChanged::Accepted { count }) => {
                tracing::debug!(count, "image field updated");
                self.errors.clear(schema.image_field());
            }
            FieldChange::Files(FilesChanged::Rejected { error }) => {
                tracing::debug!(%error, "image selection rejected");
                self.errors.set(schema.image_field(), error);
            }
        }
        Ok(())
    }

    fn expect_kind(
        &self,
        schema: &FormSchema,
        field: &str,
        fits: impl Fn(&FieldKind) -> bool,
    ) -> Result<(), FormError> {
        let spec = schema
            .field(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))?;
        if fits(&spec.kind) {
            Ok(())
        } else {
            Err(FormError::KindMismatch {
                field: field.to_string(),
                expected: spec.kind.name(),
            })
        }
    }

    fn commit(&mut self, field: String, value: FieldValue) {
        self.errors.clear(&field);
        self.values.set(field, value);
    }

    /// Current values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Current errors
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Replace every error (after validation or a backend rejection)
    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Reset values to the snapshot and drop every error
    pub fn reset(&mut self, snapshot: &FormSnapshot) {
        *self = Self::from_snapshot(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (FormSchema, FormState) {
        let schema = FormSchema::product();
        let state = FormState::from_snapshot(&FormSnapshot::for_create(&schema));
        (schema, state)
    }

    #[test]
    fn text_change_clears_field_error() {
        let (schema, mut state) = fresh();
        let mut errors = FieldErrors::new();
        errors.set("name", "Product name is required");
        errors.set("price", "Price must be greater than 0");
        state.set_errors(errors);

        state.apply(&schema, FieldChange::text("name", "Mist")).unwrap();
        assert_eq!(state.values().text("name"), Some("Mist"));
        assert!(!state.errors().contains("name"));
        assert!(state.errors().contains("price"));
    }

    #[test]
    fn select_accepts_text_event() {
        let (schema, mut state) = fresh();
        state
            .apply(&schema, FieldChange::text("category", "sport"))
            .unwrap();
        assert_eq!(state.values().text("category"), Some("sport"));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let (schema, mut state) = fresh();
        let err = state
            .apply(&schema, FieldChange::bool("price", true))
            .unwrap_err();
        assert_eq!(
            err,
            FormError::KindMismatch {
                field: "price".into(),
                expected: "number"
            }
        );
        assert_eq!(state.values().text("price"), Some(""));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let (schema, mut state) = fresh();
        assert_eq!(
            state.apply(&schema, FieldChange::text("color", "red")),
            Err(FormError::UnknownField("color".into()))
        );
    }

    #[test]
    fn file_events_drive_image_error() {
        let (schema, mut state) = fresh();
        state
            .apply(
                &schema,
                FieldChange::Files(FilesChanged::Rejected {
                    error: "Maximum 6 files. You already have 6 files.".into(),
                }),
            )
            .unwrap();
        assert_eq!(
            state.errors().get("images"),
            Some("Maximum 6 files. You already have 6 files.")
        );

        state
            .apply(&schema, FieldChange::Files(FilesChanged::Accepted { count: 1 }))
            .unwrap();
        assert!(state.errors().is_empty());
    }

    #[test]
    fn reset_restores_snapshot() {
        let (schema, mut state) = fresh();
        state.apply(&schema, FieldChange::bool("isFeatured", true)).unwrap();
        state.reset(&FormSnapshot::for_create(&schema));
        assert_eq!(state.values().get("isFeatured"), Some(&FieldValue::Bool(false)));
    }
}
