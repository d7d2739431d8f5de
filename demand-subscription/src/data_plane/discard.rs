//! Discard notifications for payloads that will never reach the subscriber.

use crate::api::payload::Payload;
use crate::api::producer::SubscriptionId;
use crate::backpressure::Buffer;
use crate::error::SubscriptionError;
use crate::observability::events;
use tracing::debug;

const COMPONENT: &str = "discard";

/// Completes every payload with its reason. Must run without the state lock held.
pub(crate) fn discard_payloads<T, I>(subscription: SubscriptionId, discarded: I)
where
    I: IntoIterator<Item = (Payload<T>, SubscriptionError)>,
{
    for (payload, reason) in discarded {
        debug!(
            event = events::PAYLOAD_DISCARDED,
            component = COMPONENT,
            subscription = %subscription,
            reason = %reason,
            "discarding payload"
        );
        payload.discard(reason);
    }
}

pub(crate) fn discard_buffer<T>(
    subscription: SubscriptionId,
    buffer: Buffer<T>,
    reason: &SubscriptionError,
) {
    discard_payloads(
        subscription,
        buffer.into_iter().map(|payload| (payload, reason.clone())),
    );
}
