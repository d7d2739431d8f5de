//! Lifecycle phases and the delivery-pass marker.

use crate::error::SubscriptionError;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Externally observable phase of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting items and delivering against demand.
    Active,
    /// Completion was signalled; draining what is buffered.
    Terminating,
    /// Absorbing end state. Nothing is admitted or delivered anymore.
    Terminated,
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Active => write!(f, "active"),
            Lifecycle::Terminating => write!(f, "terminating"),
            Lifecycle::Terminated => write!(f, "terminated"),
        }
    }
}

/// Why a subscription reached [`Lifecycle::Terminated`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TerminationCause {
    Completed,
    Cancelled,
    Failed(SubscriptionError),
}

impl TerminationCause {
    /// Discard reason for payloads caught in flight by this termination.
    pub(crate) fn residual_reason(&self) -> SubscriptionError {
        match self {
            TerminationCause::Completed | TerminationCause::Cancelled => {
                SubscriptionError::Cancelled
            }
            TerminationCause::Failed(err) => SubscriptionError::Terminated(err.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PassState {
    Idle,
    Sending,
}

/// Proof that the holder owns the single delivery pass of a subscription.
///
/// Only [`crate::control_plane::state::SubscriptionState`] mints permits, and only while
/// switching the pass marker from idle to sending. The permit is surrendered to switch
/// it back, so two passes can never hold one at the same time.
#[derive(Debug)]
pub(crate) struct PassPermit {
    _sealed: (),
}

impl PassPermit {
    pub(super) fn mint() -> Self {
        Self { _sealed: () }
    }
}
