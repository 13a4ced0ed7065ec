//! Session error types

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::state_machine::SessionState;
use sf_form::FormError;
use sf_staging::StagingError;

/// Illegal lifecycle move
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// `to` is not reachable from `from`
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },
}

/// Errors returned by [`crate::FormSession`]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A load or submission is in flight
    #[error("form is busy")]
    Busy,

    /// The operation is not valid in the current state
    #[error(transparent)]
    IllegalTransition(#[from] StateMachineError),

    /// The caller may not manage products
    #[error("admin access required")]
    Unauthorized,

    /// The record was never loaded
    #[error("product record not loaded")]
    NotLoaded,

    /// Programming error in a staging call
    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    /// The product API failed
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// A change event did not fit the schema
    #[error("form error: {0}")]
    Form(#[from] FormError),

    /// Unusable configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}
