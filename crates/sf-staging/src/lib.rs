//! Staged files and image reconciliation
//!
//! Tracks the images of one product form:
//!
//! - [`StagedFileCollection`]: locally selected files paired 1:1 with their
//!   preview handles, appended across selections and capped at
//!   [`StagingLimits::max_files`]
//! - [`ImageReconciliation`]: the edit-mode superset that also tracks the
//!   persisted images of the record and the ones marked for removal
//!
//! # Example
//!
//! ```rust
//! use sf_preview::{PreviewAllocator, PreviewRegistry, RawFile};
//! use sf_staging::{
//!     ImageReconciliation, NullControl, PersistedImageRef, StagedFileCollection, StagingLimits,
//! };
//!
//! let registry = PreviewRegistry::shared();
//! let staged = StagedFileCollection::new(
//!     registry.clone(),
//!     Box::new(NullControl),
//!     StagingLimits::default(),
//! );
//! let mut images = ImageReconciliation::new(
//!     vec![PersistedImageRef::new("/uploads/a.jpg")],
//!     staged,
//! );
//!
//! images
//!     .staged_mut()
//!     .select(vec![RawFile::new("b.png", "image/png", vec![0u8; 4])])
//!     .unwrap();
//! images.remove_persisted(&PersistedImageRef::new("/uploads/a.jpg"));
//!
//! assert_eq!(images.net_image_count(), 1);
//! assert!(images.is_image_dirty());
//!
//! drop(images);
//! assert!(registry.stats().is_balanced());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod accept;
mod collection;
mod control;
mod error;
mod reconcile;

pub use accept::AcceptFilter;
pub use collection::{SelectionReceipt, StagedFile, StagedFileCollection, StagingLimits};
pub use control::{NullControl, SelectionControl};
pub use error::StagingError;
pub use reconcile::{
    ImageReconciliation, ImageSummary, PersistedImageRef, SubmissionImages, TombstoneOutcome,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
