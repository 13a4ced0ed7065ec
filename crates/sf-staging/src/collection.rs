//! Staged file collection
//!
//! Ordered list of locally selected files, each paired with a live preview
//! handle. Selections append; a batch is accepted or rejected as a whole.

use crate::accept::AcceptFilter;
use crate::control::SelectionControl;
use crate::error::StagingError;
use serde::{Deserialize, Serialize};
use sf_preview::{PreviewAllocator, PreviewHandle, RawFile};
use std::sync::Arc;

/// Capacity and type limits of a file field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingLimits {
    /// Maximum staged files in multi-select mode
    pub max_files: usize,
    /// Multi-select mode; single-select replaces the staged file
    pub multiple: bool,
    /// Accepted file types
    pub accept: AcceptFilter,
}

impl StagingLimits {
    /// With max files
    #[inline]
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// With single or multi select
    #[inline]
    #[must_use]
    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// With accept expression
    #[inline]
    #[must_use]
    pub fn with_accept(mut self, accept: AcceptFilter) -> Self {
        self.accept = accept;
        self
    }
}

impl Default for StagingLimits {
    fn default() -> Self {
        Self {
            max_files: 6,
            multiple: true,
            accept: AcceptFilter::default(),
        }
    }
}

/// A selected file and its preview
#[derive(Debug)]
pub struct StagedFile {
    file: RawFile,
    display_name: String,
    preview: PreviewHandle,
}

impl StagedFile {
    /// The raw file
    #[inline]
    #[must_use]
    pub fn file(&self) -> &RawFile {
        &self.file
    }

    /// Name shown under the preview
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Live preview handle
    #[inline]
    #[must_use]
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// Result of an accepted selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionReceipt {
    /// Files staged by this batch
    pub added: usize,
    /// Staged count after the batch
    pub total: usize,
}

/// Ordered staged files with 1:1 preview handles
///
/// # Invariants
/// - every entry holds exactly one live handle from `allocator`
/// - outstanding handles of this collection == `len()`
/// - dropping the collection releases all of them
#[derive(Debug)]
pub struct StagedFileCollection {
    allocator: Arc<dyn PreviewAllocator>,
    control: Box<dyn SelectionControl>,
    limits: StagingLimits,
    entries: Vec<StagedFile>,
}

impl StagedFileCollection {
    /// Create empty collection
    #[must_use]
    pub fn new(
        allocator: Arc<dyn PreviewAllocator>,
        control: Box<dyn SelectionControl>,
        limits: StagingLimits,
    ) -> Self {
        Self {
            allocator,
            control,
            limits,
            entries: Vec::new(),
        }
    }

    /// Stage a batch of newly selected files
    ///
    /// Appends to the current selection in both picker modes; a selection
    /// never replaces what is already staged. The batch is all-or-nothing:
    /// if any file is of an unaccepted type, or (multi-select only) the
    /// combined count would exceed `max_files`, nothing is staged. The
    /// selection control is reset in every case.
    ///
    /// # Errors
    /// - `StagingError::UnsupportedType` if a file does not match `accept`
    /// - `StagingError::Capacity` if the batch does not fit
    pub fn select(&mut self, files: Vec<RawFile>) -> Result<SelectionReceipt, StagingError> {
        let result = self.try_select(files);
        self.control.reset();
        result
    }

    fn try_select(&mut self, files: Vec<RawFile>) -> Result<SelectionReceipt, StagingError> {
        if let Some(rejected) = files.iter().find(|f| !self.limits.accept.matches(f)) {
            tracing::debug!(file = rejected.name(), "rejected batch: unsupported type");
            return Err(StagingError::UnsupportedType {
                name: rejected.name().to_string(),
                content_type: rejected.content_type().to_string(),
                accept: self.limits.accept.to_string(),
            });
        }

        let combined = self.entries.len() + files.len();
        if self.limits.multiple && combined > self.limits.max_files {
            tracing::debug!(
                max = self.limits.max_files,
                already_held = self.entries.len(),
                incoming = files.len(),
                "rejected batch: capacity"
            );
            return Err(StagingError::Capacity {
                max: self.limits.max_files,
                already_held: self.entries.len(),
            });
        }

        let added = files.len();
        for file in files {
            self.push(file);
        }
        Ok(self.receipt(added))
    }

    fn push(&mut self, file: RawFile) {
        let preview = self.allocator.allocate(&file);
        self.entries.push(StagedFile {
            display_name: file.name().to_string(),
            file,
            preview,
        });
    }

    fn receipt(&self, added: usize) -> SelectionReceipt {
        SelectionReceipt {
            added,
            total: self.entries.len(),
        }
    }

    /// Remove the staged file at `index`, releasing its preview
    ///
    /// Resets the selection control when the collection becomes empty.
    ///
    /// # Errors
    /// - `StagingError::IndexOutOfRange` if there is no such entry (panics
    ///   under the `strict-debug` feature)
    pub fn remove(&mut self, index: usize) -> Result<RawFile, StagingError> {
        if index >= self.entries.len() {
            let len = self.entries.len();
            if cfg!(feature = "strict-debug") {
                panic!("staged file index {index} out of range (len {len})");
            }
            tracing::warn!(index, len, "ignored out-of-range staged file removal");
            return Err(StagingError::IndexOutOfRange { index, len });
        }

        let entry = self.entries.remove(index);
        self.allocator.release(&entry.preview);
        if self.entries.is_empty() {
            self.control.reset();
        }
        Ok(entry.file)
    }

    /// Release every preview and empty the collection
    ///
    /// Returns the number of files removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.release_all();
        self.control.reset();
        removed
    }

    fn release_all(&mut self) -> usize {
        let removed = self.entries.len();
        for entry in self.entries.drain(..) {
            self.allocator.release(&entry.preview);
        }
        removed
    }

    /// Staged count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StagedFile> {
        self.entries.get(index)
    }

    /// Entries in selection order
    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter()
    }

    /// Raw files in selection order
    pub fn files(&self) -> impl Iterator<Item = &RawFile> {
        self.entries.iter().map(StagedFile::file)
    }

    /// Swap the selection control (the picker was re-mounted)
    pub fn set_control(&mut self, control: Box<dyn SelectionControl>) {
        self.control = control;
    }

    /// Active limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &StagingLimits {
        &self.limits
    }

    /// Files that can still be added in multi-select mode
    #[inline]
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.limits.max_files.saturating_sub(self.entries.len())
    }

    /// Counter shown under a multi-select picker, e.g. `2 / 6 files selected`
    #[must_use]
    pub fn counter_label(&self) -> String {
        format!(
            "{} / {} files selected",
            self.entries.len(),
            self.limits.max_files
        )
    }
}

impl Drop for StagedFileCollection {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            tracing::debug!(released, "released previews on teardown");
        }
    }
}

#[cfg(all(test, not(feature = "strict-debug")))]
mod tests {
    use super::*;
    use sf_preview::PreviewRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default)]
    struct Resets(Arc<AtomicUsize>);

    impl SelectionControl for Resets {
        fn reset(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Resets {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn png(name: &str) -> RawFile {
        RawFile::new(name, "image/png", vec![1u8, 2, 3])
    }

    fn setup(max: usize) -> (Arc<PreviewRegistry>, Resets, StagedFileCollection) {
        let registry = PreviewRegistry::shared();
        let resets = Resets::default();
        let staged = StagedFileCollection::new(
            registry.clone(),
            Box::new(resets.clone()),
            StagingLimits::default().with_max_files(max),
        );
        (registry, resets, staged)
    }

    #[test]
    fn select_appends_across_batches() {
        let (registry, _, mut staged) = setup(6);
        staged.select(vec![png("a.png")]).unwrap();
        let receipt = staged.select(vec![png("b.png"), png("c.png")]).unwrap();

        assert_eq!(receipt, SelectionReceipt { added: 2, total: 3 });
        let names: Vec<_> = staged.iter().map(StagedFile::display_name).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        assert_eq!(registry.stats().outstanding, 3);
    }

    #[test]
    fn capacity_rejects_whole_batch() {
        let (registry, resets, mut staged) = setup(3);
        staged.select(vec![png("a.png"), png("b.png")]).unwrap();

        let err = staged.select(vec![png("c.png"), png("d.png")]).unwrap_err();
        assert_eq!(
            err,
            StagingError::Capacity {
                max: 3,
                already_held: 2
            }
        );
        assert_eq!(staged.len(), 2);
        assert_eq!(registry.stats().outstanding, 2);
        assert_eq!(resets.count(), 2);

        staged.select(vec![png("c.png")]).unwrap();
        assert_eq!(staged.len(), 3);
        assert_eq!(staged.remaining_capacity(), 0);
    }

    #[test]
    fn same_file_can_be_reselected_after_rejection() {
        let (_, _, mut staged) = setup(1);
        let file = png("a.png");
        staged.select(vec![file.clone()]).unwrap();
        assert!(staged.select(vec![file.clone()]).is_err());

        staged.remove(0).unwrap();
        staged.select(vec![file]).unwrap();
        assert_eq!(staged.len(), 1);
    }

    #[test]
    fn unsupported_type_rejects_whole_batch() {
        let (registry, resets, mut staged) = setup(6);
        let err = staged
            .select(vec![
                png("a.png"),
                RawFile::new("doc.pdf", "application/pdf", vec![0u8]),
            ])
            .unwrap_err();

        assert!(matches!(err, StagingError::UnsupportedType { ref name, .. } if name == "doc.pdf"));
        assert!(staged.is_empty());
        assert_eq!(registry.stats().allocated, 0);
        assert_eq!(resets.count(), 1);
    }

    #[test]
    fn remove_releases_and_resets_when_empty() {
        let (registry, resets, mut staged) = setup(6);
        staged.select(vec![png("a.png"), png("b.png")]).unwrap();
        let before = resets.count();

        let removed = staged.remove(0).unwrap();
        assert_eq!(removed.name(), "a.png");
        assert_eq!(registry.stats().outstanding, 1);
        assert_eq!(resets.count(), before);

        staged.remove(0).unwrap();
        assert_eq!(registry.stats().outstanding, 0);
        assert_eq!(resets.count(), before + 1);
    }

    #[test]
    fn remove_out_of_range_is_error() {
        let (registry, _, mut staged) = setup(6);
        staged.select(vec![png("a.png")]).unwrap();
        assert_eq!(
            staged.remove(4).unwrap_err(),
            StagingError::IndexOutOfRange { index: 4, len: 1 }
        );
        assert_eq!(staged.len(), 1);
        assert_eq!(registry.stats().outstanding, 1);
    }

    #[test]
    fn clear_releases_everything() {
        let (registry, resets, mut staged) = setup(6);
        staged.select(vec![png("a.png"), png("b.png")]).unwrap();
        assert_eq!(staged.clear(), 2);
        assert!(staged.is_empty());
        assert!(registry.stats().is_balanced());
        assert_eq!(resets.count(), 2);
    }

    #[test]
    fn drop_releases_outstanding() {
        let (registry, _, mut staged) = setup(6);
        staged.select(vec![png("a.png"), png("b.png")]).unwrap();
        drop(staged);
        let stats = registry.stats();
        assert_eq!(stats.allocated, 2);
        assert!(stats.is_balanced());
    }

    #[test]
    fn single_select_appends_without_capacity_check() {
        let registry = PreviewRegistry::shared();
        let mut staged = StagedFileCollection::new(
            registry.clone(),
            Box::new(crate::NullControl),
            StagingLimits::default().with_multiple(false).with_max_files(2),
        );
        staged.select(vec![png("a.png")]).unwrap();
        let receipt = staged.select(vec![png("b.png"), png("c.png")]).unwrap();

        assert_eq!(receipt.added, 2);
        assert_eq!(receipt.total, 3);
        let names: Vec<_> = staged.iter().map(StagedFile::display_name).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        assert_eq!(registry.stats().outstanding, 3);
        assert_eq!(registry.stats().released, 0);
    }

    #[test]
    fn counter_label() {
        let (_, _, mut staged) = setup(6);
        staged.select(vec![png("a.png"), png("b.png")]).unwrap();
        assert_eq!(staged.counter_label(), "2 / 6 files selected");
    }
}
