//! Error kinds surfaced by subscriptions and their configuration.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Reasons a payload or a whole stream ends without a normal delivery.
///
/// `InvalidDemand` and `Upstream` are stream-level and reach the subscriber through
/// `on_error`. Every other variant is payload-level and only ever reaches the callback
/// carried by the payload it concerns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionError {
    /// `request` was called with a non-positive amount.
    InvalidDemand(i64),
    /// The active backpressure policy evicted the payload.
    DiscardedByPolicy { policy: String },
    /// The payload was published after completion was signalled or the stream ended.
    Closed,
    /// The payload was still pending when the subscription was cancelled.
    Cancelled,
    /// The payload was still pending when the stream terminated with an error.
    Terminated(String),
    /// The producer reported a failure.
    Upstream(String),
    /// The subscriber panicked earlier in the same delivery batch.
    SubscriberPanicked(String),
    /// The payload was dropped without being acknowledged or discarded.
    Abandoned,
}

impl SubscriptionError {
    /// Whether the error terminates the stream for the subscriber, as opposed to a
    /// single payload.
    pub fn is_stream_level(&self) -> bool {
        matches!(
            self,
            SubscriptionError::InvalidDemand(_) | SubscriptionError::Upstream(_)
        )
    }
}

impl Display for SubscriptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionError::InvalidDemand(n) => {
                write!(f, "Non-positive demand requested: {n} (rule 3.9)")
            }
            SubscriptionError::DiscardedByPolicy { policy } => {
                write!(f, "Item discarded by backpressure strategy {policy}")
            }
            SubscriptionError::Closed => write!(f, "Item discarded: subscription closed"),
            SubscriptionError::Cancelled => {
                write!(f, "Cannot process the item: subscription cancelled")
            }
            SubscriptionError::Terminated(reason) => {
                write!(f, "Cannot process the item: subscription terminated ({reason})")
            }
            SubscriptionError::Upstream(reason) => write!(f, "Upstream failure: {reason}"),
            SubscriptionError::SubscriberPanicked(reason) => {
                write!(f, "Cannot process the item: subscriber panicked ({reason})")
            }
            SubscriptionError::Abandoned => {
                write!(f, "Item dropped without being acknowledged")
            }
        }
    }
}

impl Error for SubscriptionError {}

/// Failures while loading or validating a [`crate::SubscriptionConfig`].
pub enum ConfigError {
    FileNotFound(PathBuf, io::Error),
    Unreadable(PathBuf, io::Error),
    Malformed(serde_json::Error),
    Invalid(String),
}

impl fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path, err) => {
                write!(f, "FileNotFound({path:?}, {err:?})")
            }
            ConfigError::Unreadable(path, err) => write!(f, "Unreadable({path:?}, {err:?})"),
            ConfigError::Malformed(err) => write!(f, "Malformed({err:?})"),
            ConfigError::Invalid(reason) => write!(f, "Invalid({reason:?})"),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path, err) => {
                write!(f, "Subscription config not found at {}: {err}", path.display())
            }
            ConfigError::Unreadable(path, err) => {
                write!(f, "Unable to read subscription config {}: {err}", path.display())
            }
            ConfigError::Malformed(err) => write!(f, "Unable to parse subscription config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "Invalid subscription config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::FileNotFound(_, err) | ConfigError::Unreadable(_, err) => Some(err),
            ConfigError::Malformed(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err)
    }
}
