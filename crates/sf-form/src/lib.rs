//! Product form model
//!
//! Everything about the form that is not an image:
//!
//! - [`FormSchema`]: field kinds, select options and validation checks
//! - [`FieldValue`] / [`FieldValues`]: current values, in schema order
//! - [`FormSnapshot`]: immutable load-time copy used for dirty comparison
//! - [`FieldChange`]: the one change event shared by every field kind
//! - [`FormState`]: values plus per-field errors, updated by a single reducer
//! - [`is_dirty`]: pure "has unsaved changes" evaluation
//! - [`validate`]: field and image-count validation
//!
//! # Example
//!
//! ```rust
//! use sf_form::{FieldChange, FormSchema, FormSnapshot, FormState};
//!
//! let schema = FormSchema::product();
//! let snapshot = FormSnapshot::for_create(&schema);
//! let mut state = FormState::from_snapshot(&snapshot);
//!
//! state
//!     .apply(&schema, FieldChange::text("name", "Ocean Mist"))
//!     .unwrap();
//! assert_eq!(state.values().text("name"), Some("Ocean Mist"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod dirty;
mod errors;
mod event;
mod schema;
mod snapshot;
mod state;
mod validate;
mod value;

pub use dirty::{dirty_fields, field_changed, is_dirty};
pub use errors::{FieldErrors, FormError};
pub use event::{FieldChange, FilesChanged};
pub use schema::{Check, FieldKind, FieldSpec, FormSchema, Rule, SelectOption};
pub use snapshot::FormSnapshot;
pub use state::FormState;
pub use validate::{image_count_message, validate};
pub use value::{FieldValue, FieldValues};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
