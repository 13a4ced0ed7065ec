//! Product form session
//!
//! Ties the staging, reconciliation and form crates into one create/edit
//! session:
//!
//! - [`EngineConfig`]: limits and part names, loaded from TOML
//! - [`AuthContext`]: caller identity passed to every API call
//! - [`FormSession`]: lifecycle, single event reducer, submit gate
//! - [`payload::build`]: deterministic multipart payload
//! - [`ProductApi`]: async boundary to the product backend
//!
//! # Example
//!
//! ```rust
//! use sf_form::FieldChange;
//! use sf_preview::{PreviewAllocator, PreviewRegistry, RawFile};
//! use sf_session::{AuthContext, EngineConfig, FormEvent, FormSession, SubmitStep};
//!
//! let registry = PreviewRegistry::shared();
//! let mut session = FormSession::create(
//!     EngineConfig::default(),
//!     AuthContext::admin("token"),
//!     registry.clone(),
//! )
//! .unwrap();
//!
//! session.dispatch(FieldChange::text("name", "Ocean Mist")).unwrap();
//! session
//!     .dispatch(FormEvent::Select(vec![RawFile::new("a.png", "image/png", vec![1u8])]))
//!     .unwrap();
//!
//! // price, stock, category and description are still missing
//! let SubmitStep::Finished(outcome) = session.begin_submit().unwrap() else {
//!     unreachable!()
//! };
//! println!("{outcome:?}");
//!
//! session.teardown().unwrap();
//! assert!(registry.stats().is_balanced());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod api;
mod auth;
mod config;
mod error;
pub mod payload;
mod session;
mod state_machine;

pub use api::{
    ApiError, ApiOperation, BackendFieldError, Notification, NotificationLevel, ProductApi,
    ProductId, ProductRecord,
};
pub use auth::{AuthContext, Role};
pub use config::{ConfigError, EngineConfig, FieldNames};
pub use error::{SessionError, StateMachineError};
pub use payload::{Payload, Part, PartBody};
pub use session::{
    FormEvent, FormMode, FormSession, PreparedSubmission, SubmitFailure, SubmitOutcome,
    SubmitStep,
};
pub use state_machine::{allowed_transitions, validate_transition, SessionState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
