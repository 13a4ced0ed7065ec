//! Immutable load-time snapshot

use crate::schema::FormSchema;
use crate::value::FieldValues;
use serde_json::Value;
use sf_staging::PersistedImageRef;

/// Field values and persisted images as they were when the form loaded
///
/// Only read for dirty comparison; there is no way to mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    values: FieldValues,
    images: Vec<PersistedImageRef>,
}

impl FormSnapshot {
    /// Snapshot from explicit values
    #[inline]
    #[must_use]
    pub fn new(values: FieldValues, images: Vec<PersistedImageRef>) -> Self {
        Self { values, images }
    }

    /// Empty defaults of a create form
    #[must_use]
    pub fn for_create(schema: &FormSchema) -> Self {
        Self::new(FieldValues::defaults(schema), Vec::new())
    }

    /// Snapshot of a fetched record
    #[must_use]
    pub fn from_record(
        schema: &FormSchema,
        fields: &serde_json::Map<String, Value>,
        images: Vec<PersistedImageRef>,
    ) -> Self {
        Self::new(FieldValues::from_record(schema, fields), images)
    }

    /// Field values at load
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Persisted images at load
    #[inline]
    #[must_use]
    pub fn images(&self) -> &[PersistedImageRef] {
        &self.images
    }
}
