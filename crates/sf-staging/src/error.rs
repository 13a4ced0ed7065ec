//! Staging errors

/// Errors raised by the staged file collection
///
/// None of these mutate the collection: a rejected batch stages nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    /// The batch would push the collection past its capacity
    #[error("Maximum {max} files. You already have {already_held} files.")]
    Capacity {
        /// Configured maximum
        max: usize,
        /// Files staged before the rejected batch
        already_held: usize,
    },

    /// A file in the batch does not match the accepted types
    #[error("{name} ({content_type}) is not an accepted file type ({accept})")]
    UnsupportedType {
        /// Offending file name
        name: String,
        /// Its reported MIME type
        content_type: String,
        /// Accept expression in force
        accept: String,
    },

    /// Programming error: no staged file at that index
    #[error("no staged file at index {index} (have {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Staged count
        len: usize,
    },
}

impl StagingError {
    /// Whether the error should be shown to the user next to the field
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::IndexOutOfRange { .. })
    }
}
