//! Multipart submission payload
//!
//! Part order is fixed so that two builds of the same state are identical:
//!
//! 1. scalar fields, in schema order, as text parts
//! 2. staged files, in selection order (`images` on create, `newImages` on
//!    edit)
//! 3. kept persisted images (`existingImages`, edit only)
//! 4. tombstoned persisted images (`deletedImages`, edit only)

use crate::config::FieldNames;
use crate::session::FormMode;
use serde::Serialize;
use sf_form::{FieldValue, FieldValues, FormSchema};
use sf_preview::RawFile;
use sf_staging::ImageReconciliation;
use std::sync::Arc;

/// Body of one multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Form field text
    Text(String),
    /// Uploaded file
    File {
        /// Original file name
        file_name: String,
        /// MIME type
        content_type: String,
        /// File contents
        bytes: Arc<[u8]>,
    },
}

/// One named multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part name
    pub name: String,
    /// Part body
    pub body: PartBody,
}

impl Part {
    fn text(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            body: PartBody::Text(value.into()),
        }
    }

    fn file(name: &str, file: &RawFile) -> Self {
        Self {
            name: name.to_string(),
            body: PartBody::File {
                file_name: file.name().to_string(),
                content_type: file.content_type().to_string(),
                bytes: Arc::clone(file.bytes()),
            },
        }
    }

    /// Text value, for text parts
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text(value) => Some(value),
            PartBody::File { .. } => None,
        }
    }
}

/// Ordered multipart body of a create or update request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    parts: Vec<Part>,
}

impl Payload {
    /// Parts in send order
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Number of parts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether there are no parts
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Every part named `name`, in order
    pub fn named<'s, 'n>(&'s self, name: &'n str) -> impl Iterator<Item = &'s Part> + 'n
    where
        's: 'n,
    {
        self.parts.iter().filter(move |p| p.name == name)
    }

    /// First text value of `name`
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .find_map(Part::as_text)
    }

    /// Printable description of every part (file bytes elided)
    #[must_use]
    pub fn summary(&self) -> Vec<PartSummary> {
        self.parts
            .iter()
            .map(|part| match &part.body {
                PartBody::Text(value) => PartSummary {
                    name: part.name.clone(),
                    value: Some(value.clone()),
                    file: None,
                },
                PartBody::File {
                    file_name,
                    content_type,
                    bytes,
                } => PartSummary {
                    name: part.name.clone(),
                    value: None,
                    file: Some(FileSummary {
                        file_name: file_name.clone(),
                        content_type: content_type.clone(),
                        size: bytes.len(),
                    }),
                },
            })
            .collect()
    }
}

/// Printable form of a [`Part`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSummary {
    /// Part name
    pub name: String,
    /// Text value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// File description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSummary>,
}

/// Printable form of a file part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Size in bytes
    pub size: usize,
}

/// Build the payload of a submission
///
/// Booleans are sent as `true`/`false`, numbers as the raw entered text.
/// Fields missing from `values` are sent with their empty default.
#[must_use]
pub fn build(
    mode: &FormMode,
    schema: &FormSchema,
    values: &FieldValues,
    images: &ImageReconciliation,
    names: &FieldNames,
) -> Payload {
    let mut parts = Vec::with_capacity(
        schema.fields().len() + images.staged().len() + images.original().len(),
    );

    for field in schema.fields() {
        let text = match values.get(&field.name) {
            Some(value) => value.as_text(),
            None => FieldValue::default_for(&field.kind).as_text(),
        };
        parts.push(Part::text(&field.name, text));
    }

    let groups = images.to_submission_images();
    match mode {
        FormMode::Create => {
            parts.extend(groups.new_files.iter().map(|f| Part::file(&names.create_images, f)));
        }
        FormMode::Edit(_) => {
            parts.extend(groups.new_files.iter().map(|f| Part::file(&names.edit_new_images, f)));
            parts.extend(
                groups
                    .kept_remote
                    .iter()
                    .map(|r| Part::text(&names.existing_images, r.uri())),
            );
            parts.extend(
                groups
                    .removed_remote
                    .iter()
                    .map(|r| Part::text(&names.deleted_images, r.uri())),
            );
        }
    }

    tracing::debug!(
        parts = parts.len(),
        files = groups.new_files.len(),
        kept = groups.kept_remote.len(),
        deleted = groups.removed_remote.len(),
        "built submission payload"
    );
    Payload { parts }
}
