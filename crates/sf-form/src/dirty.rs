//! Dirty-state evaluation
//!
//! Pure functions of the current state and the load-time snapshot. Nothing
//! is cached; callers recompute on every evaluation.

use crate::schema::{FieldKind, FormSchema};
use crate::snapshot::FormSnapshot;
use crate::value::{FieldValue, FieldValues};
use sf_staging::ImageReconciliation;

/// Whether one field differs from its snapshot value
///
/// - text and select: trimmed equality
/// - number: numeric equality (`"10"` equals `10`); values that do not
///   parse compare by trimmed text
/// - bool: truthiness
#[must_use]
pub fn field_changed(
    kind: &FieldKind,
    current: Option<&FieldValue>,
    original: Option<&FieldValue>,
) -> bool {
    let empty = FieldValue::default_for(kind);
    let current = current.unwrap_or(&empty);
    let original = original.unwrap_or(&empty);

    match kind {
        FieldKind::Text | FieldKind::Select { .. } => {
            current.as_text().trim() != original.as_text().trim()
        }
        FieldKind::Number => match (current.numeric(), original.numeric()) {
            (Some(a), Some(b)) => a != b,
            _ => current.as_text().trim() != original.as_text().trim(),
        },
        FieldKind::Bool => current.truthy() != original.truthy(),
    }
}

/// Names of the scalar fields that differ from the snapshot, in schema order
#[must_use]
pub fn dirty_fields<'a>(
    schema: &'a FormSchema,
    current: &FieldValues,
    snapshot: &FormSnapshot,
) -> Vec<&'a str> {
    schema
        .fields()
        .iter()
        .filter(|f| {
            field_changed(
                &f.kind,
                current.get(&f.name),
                snapshot.values().get(&f.name),
            )
        })
        .map(|f| f.name.as_str())
        .collect()
}

/// Whether the form has any unsaved change
///
/// Dirty when any scalar field differs, or when files are staged, or when a
/// persisted image is marked for removal. Kept persisted images never count.
#[must_use]
pub fn is_dirty(
    schema: &FormSchema,
    current: &FieldValues,
    snapshot: &FormSnapshot,
    images: &ImageReconciliation,
) -> bool {
    images.is_image_dirty()
        || schema.fields().iter().any(|f| {
            field_changed(
                &f.kind,
                current.get(&f.name),
                snapshot.values().get(&f.name),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sf_preview::{PreviewRegistry, RawFile};
    use sf_staging::{NullControl, PersistedImageRef, StagedFileCollection, StagingLimits};

    fn loaded() -> (FormSchema, FormSnapshot, ImageReconciliation) {
        let schema = FormSchema::product();
        let record = json!({
            "name": "A",
            "price": 10,
            "stock": 5,
            "category": "daily",
            "isFeatured": false,
            "description": "Fresh"
        });
        let images = vec![PersistedImageRef::new("r1"), PersistedImageRef::new("r2")];
        let snapshot =
            FormSnapshot::from_record(&schema, record.as_object().unwrap(), images.clone());
        let staged = StagedFileCollection::new(
            PreviewRegistry::shared(),
            Box::new(NullControl),
            StagingLimits::default(),
        );
        (schema, snapshot, ImageReconciliation::new(images, staged))
    }

    #[test]
    fn untouched_form_is_clean() {
        let (schema, snapshot, images) = loaded();
        let current = snapshot.values().clone();
        assert!(!is_dirty(&schema, &current, &snapshot, &images));
    }

    #[test]
    fn numeric_string_equal_to_number_is_clean() {
        let (schema, snapshot, images) = loaded();
        let mut current = snapshot.values().clone();
        current.set("price", FieldValue::Number("10".into()));
        assert!(!is_dirty(&schema, &current, &snapshot, &images));

        current.set("price", FieldValue::Number("10.00".into()));
        assert!(!is_dirty(&schema, &current, &snapshot, &images));

        current.set("price", FieldValue::Number("11".into()));
        assert!(is_dirty(&schema, &current, &snapshot, &images));
        assert_eq!(dirty_fields(&schema, &current, &snapshot), ["price"]);
    }

    #[test]
    fn whitespace_only_text_edit_is_clean() {
        let (schema, snapshot, images) = loaded();
        let mut current = snapshot.values().clone();
        current.set("name", FieldValue::Text("  A \n".into()));
        assert!(!is_dirty(&schema, &current, &snapshot, &images));

        current.set("description", FieldValue::Text("Fresher".into()));
        assert!(is_dirty(&schema, &current, &snapshot, &images));
    }

    #[test]
    fn bool_compares_by_truthiness() {
        let kind = FieldKind::Bool;
        assert!(!field_changed(&kind, Some(&FieldValue::Bool(false)), None));
        assert!(field_changed(&kind, Some(&FieldValue::Bool(true)), None));
    }

    #[test]
    fn unparsable_number_left_alone_is_clean() {
        let kind = FieldKind::Number;
        let odd = FieldValue::Number("abc".into());
        assert!(!field_changed(&kind, Some(&odd), Some(&odd)));
        assert!(field_changed(
            &kind,
            Some(&FieldValue::Number("abd".into())),
            Some(&odd)
        ));
    }

    #[test]
    fn tombstone_makes_form_dirty() {
        let (schema, snapshot, mut images) = loaded();
        let current = snapshot.values().clone();
        images.remove_persisted(&PersistedImageRef::new("r1"));
        assert!(is_dirty(&schema, &current, &snapshot, &images));
    }

    #[test]
    fn staged_add_then_remove_is_clean_again() {
        let (schema, snapshot, mut images) = loaded();
        let current = snapshot.values().clone();

        images
            .staged_mut()
            .select(vec![RawFile::new("f.png", "image/png", vec![1u8])])
            .unwrap();
        assert!(is_dirty(&schema, &current, &snapshot, &images));

        images.staged_mut().remove(0).unwrap();
        assert!(!is_dirty(&schema, &current, &snapshot, &images));
    }

    #[test]
    fn evaluation_does_not_mutate_inputs() {
        let (schema, snapshot, images) = loaded();
        let current = snapshot.values().clone();
        let before = (current.clone(), snapshot.clone(), images.summary());
        let _ = is_dirty(&schema, &current, &snapshot, &images);
        assert_eq!(before, (current, snapshot, images.summary()));
    }
}
