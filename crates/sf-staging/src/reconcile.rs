//! Persisted image reconciliation
//!
//! Merges the images already stored for a record, the ones the user marked
//! for deletion (tombstones) and the newly staged files into the net image
//! set of the form.

use crate::collection::StagedFileCollection;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sf_preview::RawFile;

/// Stable identifier of an image already stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedImageRef(String);

impl PersistedImageRef {
    /// Wrap a remote identifier
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Remote identifier, as sent back in the payload
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// URL to display the image, resolved against `base` when relative
    ///
    /// Display only: tombstones and payload parts always use [`Self::uri`].
    #[must_use]
    pub fn display_url(&self, base: Option<&str>) -> String {
        let is_absolute = self.0.starts_with("http://")
            || self.0.starts_with("https://")
            || self.0.starts_with("//");
        match base {
            Some(base) if !is_absolute && !base.is_empty() => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.0.trim_start_matches('/')
            ),
            _ => self.0.clone(),
        }
    }
}

impl std::fmt::Display for PersistedImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersistedImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Result of marking a persisted image for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TombstoneOutcome {
    /// Moved from kept to removed
    Tombstoned,
    /// Already marked; nothing changed
    AlreadyRemoved,
    /// Not part of the record's images; nothing changed
    Unknown,
}

/// The three disjoint image groups sent on submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionImages {
    /// Staged files to upload, in selection order
    pub new_files: Vec<RawFile>,
    /// Persisted images to retain, in record order
    pub kept_remote: Vec<PersistedImageRef>,
    /// Persisted images to delete, in tombstone order
    pub removed_remote: Vec<PersistedImageRef>,
}

/// Counts shown in the edit form's image summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    /// Persisted images still kept
    pub current: usize,
    /// Staged files to upload
    pub new: usize,
    /// Persisted images marked for deletion
    pub to_delete: usize,
    /// Image count after a successful save
    pub total_after_save: usize,
}

/// Net image state of one form
///
/// # Invariants
/// - `kept ∪ removed == original`
/// - `kept ∩ removed == ∅`, no duplicates
/// - `kept` preserves record order
#[derive(Debug)]
pub struct ImageReconciliation {
    original: Vec<PersistedImageRef>,
    kept: IndexSet<PersistedImageRef>,
    removed: IndexSet<PersistedImageRef>,
    staged: StagedFileCollection,
}

impl ImageReconciliation {
    /// Create from the record's persisted images
    ///
    /// Duplicate refs in `original` are collapsed to their first occurrence.
    #[must_use]
    pub fn new(
        original: impl IntoIterator<Item = PersistedImageRef>,
        staged: StagedFileCollection,
    ) -> Self {
        let kept: IndexSet<PersistedImageRef> = original.into_iter().collect();
        Self {
            original: kept.iter().cloned().collect(),
            kept,
            removed: IndexSet::new(),
            staged,
        }
    }

    /// Create for a new record (no persisted images)
    #[inline]
    #[must_use]
    pub fn for_create(staged: StagedFileCollection) -> Self {
        Self::new(Vec::new(), staged)
    }

    /// Replace the persisted images once the record has been fetched
    ///
    /// Drops every tombstone; staged files are untouched.
    pub fn load_original(&mut self, original: impl IntoIterator<Item = PersistedImageRef>) {
        self.kept = original.into_iter().collect();
        self.original = self.kept.iter().cloned().collect();
        self.removed.clear();
    }

    /// Mark a persisted image for removal
    ///
    /// Idempotent: a second call reports `AlreadyRemoved` and leaves a
    /// single tombstone.
    pub fn remove_persisted(&mut self, image: &PersistedImageRef) -> TombstoneOutcome {
        if self.kept.shift_remove(image) {
            self.removed.insert(image.clone());
            tracing::debug!(image = %image, kept = self.kept.len(), "tombstoned image");
            return TombstoneOutcome::Tombstoned;
        }
        if self.removed.contains(image) {
            return TombstoneOutcome::AlreadyRemoved;
        }
        tracing::warn!(image = %image, "ignored removal of unknown image");
        TombstoneOutcome::Unknown
    }

    /// Undo a tombstone, restoring the image at its record position
    ///
    /// Returns `false` if `image` was not marked for removal.
    pub fn restore_persisted(&mut self, image: &PersistedImageRef) -> bool {
        if !self.removed.shift_remove(image) {
            return false;
        }
        self.kept = self
            .original
            .iter()
            .filter(|r| !self.removed.contains(*r))
            .cloned()
            .collect();
        true
    }

    /// Persisted images as loaded
    #[inline]
    #[must_use]
    pub fn original(&self) -> &[PersistedImageRef] {
        &self.original
    }

    /// Persisted images still kept, in record order
    pub fn kept(&self) -> impl Iterator<Item = &PersistedImageRef> {
        self.kept.iter()
    }

    /// Persisted images marked for removal, in tombstone order
    pub fn removed(&self) -> impl Iterator<Item = &PersistedImageRef> {
        self.removed.iter()
    }

    /// Whether `image` is marked for removal
    #[inline]
    #[must_use]
    pub fn is_removed(&self, image: &PersistedImageRef) -> bool {
        self.removed.contains(image)
    }

    /// Staged files
    #[inline]
    #[must_use]
    pub fn staged(&self) -> &StagedFileCollection {
        &self.staged
    }

    /// Staged files, for select/remove/clear
    #[inline]
    pub fn staged_mut(&mut self) -> &mut StagedFileCollection {
        &mut self.staged
    }

    /// `|kept| + |staged|`
    #[inline]
    #[must_use]
    pub fn net_image_count(&self) -> usize {
        self.kept.len() + self.staged.len()
    }

    /// Whether the images differ from the record
    ///
    /// Kept images never count as a change; only staged files and
    /// tombstones do.
    #[inline]
    #[must_use]
    pub fn is_image_dirty(&self) -> bool {
        !self.staged.is_empty() || !self.removed.is_empty()
    }

    /// Split into the three payload groups
    #[must_use]
    pub fn to_submission_images(&self) -> SubmissionImages {
        SubmissionImages {
            new_files: self.staged.files().cloned().collect(),
            kept_remote: self.kept.iter().cloned().collect(),
            removed_remote: self.removed.iter().cloned().collect(),
        }
    }

    /// Counts for the image summary box
    #[must_use]
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            current: self.kept.len(),
            new: self.staged.len(),
            to_delete: self.removed.len(),
            total_after_save: self.net_image_count(),
        }
    }

    /// Check the closed-world invariant
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.kept.len() + self.removed.len() == self.original.len()
            && self.kept.iter().all(|r| !self.removed.contains(r))
            && self
                .original
                .iter()
                .all(|r| self.kept.contains(r) || self.removed.contains(r))
    }
}
