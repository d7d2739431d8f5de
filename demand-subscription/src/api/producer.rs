//! Producer-side handle and subscription identity.

use std::fmt;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of one subscription, used by producers to track registrations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Upstream capability told when a subscription is done.
///
/// `unsubscribe` is called at most once per subscription, never while the subscription
/// holds its internal state lock.
pub trait ProducerHandle: Send + Sync {
    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// Producer handle for subscriptions nobody needs to deregister.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedProducer;

impl ProducerHandle for DetachedProducer {
    fn unsubscribe(&self, _subscription: SubscriptionId) {}
}
