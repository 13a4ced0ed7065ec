//! Preview handle management for locally staged files
//!
//! Every file the user stages gets an ephemeral, revocable preview
//! reference. This crate allocates those references and guarantees that
//! each one is released at most once:
//!
//! - [`RawFile`]: the opaque local file exposed by a selection control
//! - [`PreviewHandle`]: the revocable reference handed to the UI
//! - [`PreviewAllocator`]: the allocate/release seam (mockable in tests)
//! - [`PreviewRegistry`]: default in-memory allocator
//!
//! # Example
//!
//! ```rust
//! use sf_preview::{PreviewAllocator, PreviewRegistry, RawFile, ReleaseOutcome};
//!
//! let registry = PreviewRegistry::new();
//! let file = RawFile::new("shoe.png", "image/png", vec![1u8, 2, 3]);
//!
//! let handle = registry.allocate(&file);
//! assert_eq!(registry.stats().outstanding, 1);
//!
//! assert_eq!(registry.release(&handle), ReleaseOutcome::Released);
//! assert_eq!(registry.release(&handle), ReleaseOutcome::AlreadyReleased);
//! assert_eq!(registry.stats().outstanding, 0);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod file;
mod handle;
mod registry;

pub use file::{FileId, RawFile};
pub use handle::{HandleId, PreviewHandle, PreviewStats, PreviewUri, ReleaseOutcome};
pub use registry::{PreviewAllocator, PreviewRegistry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
