//! Field validation

use crate::errors::FieldErrors;
use crate::schema::{FieldKind, FieldSpec, FormSchema, Rule};
use crate::value::{FieldValue, FieldValues};

/// Message for a failed image-count check
#[must_use]
pub fn image_count_message(min_images: usize) -> String {
    if min_images == 1 {
        "At least 1 product image is required".to_string()
    } else {
        format!("At least {min_images} product images are required")
    }
}

/// Validate every field of `values` and the net image count
///
/// Each field reports only its first failing check. The image field fails
/// when `net_images < min_images`. Returns an empty map when the form can
/// be submitted.
#[must_use]
pub fn validate(
    schema: &FormSchema,
    values: &FieldValues,
    net_images: usize,
    min_images: usize,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for field in schema.fields() {
        let empty = FieldValue::default_for(&field.kind);
        let value = values.get(&field.name).unwrap_or(&empty);
        if let Some(message) = first_failure(field, value) {
            errors.set(field.name.clone(), message);
        }
    }

    if net_images < min_images {
        errors.set(schema.image_field(), image_count_message(min_images));
    }

    if !errors.is_empty() {
        tracing::debug!(failed = errors.len(), "validation failed");
    }
    errors
}

fn first_failure<'a>(field: &'a FieldSpec, value: &FieldValue) -> Option<&'a str> {
    field
        .checks
        .iter()
        .find(|check| !passes(check.rule, &field.kind, value))
        .map(|check| check.message.as_str())
}

fn passes(rule: Rule, kind: &FieldKind, value: &FieldValue) -> bool {
    match rule {
        Rule::Required => !value.is_blank(),
        Rule::GreaterThan(bound) => !value.is_blank() && value.numeric().is_some_and(|n| n > bound),
        Rule::AtLeast(bound) => value.numeric().is_some_and(|n| n >= bound),
        Rule::OneOfOptions => match kind {
            FieldKind::Select { options } => {
                let raw = value.as_text();
                let raw = raw.trim();
                options.iter().any(|o| !o.value.is_empty() && o.value == raw)
            }
            _ => true,
        },
    }
}
