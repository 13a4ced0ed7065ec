//! Form session lifecycle
//!
//! ```text
//! Loading ──► Ready ◄──► Editing ──► Validating ──► Submitting ──► Done
//!    │          ▲                        │              │
//!    ▼          └────────────────────────┴──────────────┘ (errors / failure)
//! LoadFailed
//! ```
//!
//! Every state except `Validating` and `Submitting` may move to `Closed`.

use crate::error::StateMachineError;
use serde::Serialize;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the record (edit mode)
    Loading,
    /// The record could not be fetched
    LoadFailed,
    /// Loaded, no edits since the last settle
    Ready,
    /// The user has changed something
    Editing,
    /// Running local validation
    Validating,
    /// Request in flight
    Submitting,
    /// Saved
    Done,
    /// Torn down; every preview released
    Closed,
}

impl SessionState {
    /// Whether the user can edit in this state
    #[inline]
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Ready | Self::Editing)
    }
}

/// Validate a state transition
///
/// # Errors
/// `StateMachineError::IllegalTransition` if `to` is not reachable from
/// `from` (panics under the `strict-debug` feature)
pub fn validate_transition(from: SessionState, to: SessionState) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        if cfg!(feature = "strict-debug") {
            panic!("Illegal session transition attempted: {from:?} -> {to:?}");
        }
        tracing::warn!(?from, ?to, "illegal session transition");
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SessionState) -> Vec<SessionState> {
    use SessionState::*;
    match from {
        Loading => vec![Ready, LoadFailed, Closed],
        LoadFailed => vec![Closed],
        Ready => vec![Editing, Validating, Closed],
        Editing => vec![Editing, Validating, Closed],
        Validating => vec![Ready, Submitting],
        Submitting => vec![Ready, Done],
        Done => vec![Closed],
        Closed => vec![],
    }
}

fn allowed(from: SessionState, to: SessionState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(all(test, not(feature = "strict-debug")))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use SessionState::*;

    const ALL: [SessionState; 8] = [
        Loading, LoadFailed, Ready, Editing, Validating, Submitting, Done, Closed,
    ];

    #[test]
    fn happy_path() {
        for (from, to) in [
            (Loading, Ready),
            (Ready, Editing),
            (Editing, Editing),
            (Editing, Validating),
            (Validating, Submitting),
            (Submitting, Done),
            (Done, Closed),
        ] {
            assert!(validate_transition(from, to).is_ok(), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn failures_return_to_ready() {
        assert!(validate_transition(Validating, Ready).is_ok());
        assert!(validate_transition(Submitting, Ready).is_ok());
        assert!(validate_transition(Loading, LoadFailed).is_ok());
    }

    #[test]
    fn in_flight_states_cannot_close() {
        assert_eq!(
            validate_transition(Submitting, Closed),
            Err(StateMachineError::IllegalTransition {
                from: Submitting,
                to: Closed
            })
        );
        assert!(validate_transition(Validating, Closed).is_err());
    }

    #[test]
    fn closed_is_terminal() {
        assert!(allowed_transitions(Closed).is_empty());
    }

    proptest! {
        #[test]
        fn validate_agrees_with_table(from in 0usize..8, to in 0usize..8) {
            let (from, to) = (ALL[from], ALL[to]);
            prop_assert_eq!(
                validate_transition(from, to).is_ok(),
                allowed_transitions(from).contains(&to)
            );
        }
    }
}
