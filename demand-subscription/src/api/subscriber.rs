//! Consumer-side contract of a subscription.

use crate::api::payload::Payload;
use crate::error::SubscriptionError;

/// The single downstream consumer of a [`crate::DemandSubscription`].
///
/// `on_next` is never called concurrently for one subscription and never more often than
/// the demand granted through `request`. At most one terminal signal, `on_complete` or
/// `on_error`, is ever called, and no `on_next` follows it.
///
/// The subscriber owns each delivered payload and is expected to `ack` it (or `discard`
/// it) once processed; a payload dropped unfinished reports
/// [`SubscriptionError::Abandoned`]. Callbacks may call back into the subscription.
///
/// A panic in `on_next` is contained by the delivery pass: the rest of that batch is
/// discarded with [`SubscriptionError::SubscriberPanicked`] and the subscription keeps
/// serving later demand.
pub trait Subscriber<T>: Send + Sync {
    fn on_next(&self, payload: Payload<T>);

    fn on_complete(&self);

    fn on_error(&self, error: SubscriptionError);
}
