//! Delivery pass: drains buffered payloads to the subscriber against demand.

use crate::api::payload::Payload;
use crate::control_plane::lifecycle::PassPermit;
use crate::control_plane::state::{Batch, FlushDecision};
use crate::data_plane::discard::discard_payloads;
use crate::error::SubscriptionError;
use crate::observability::events;
use crate::subscription::SubscriptionCore;
use std::any::Any;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

const COMPONENT: &str = "delivery_pass";

/// A pass handed to the execution context but not started yet.
///
/// Dropping it unstarted, e.g. by an executor shutting down, frees the pass marker so a
/// later request or publish can dispatch again.
struct ScheduledPass<T> {
    core: Arc<SubscriptionCore<T>>,
    permit: Option<PassPermit>,
}

impl<T: Send + 'static> ScheduledPass<T> {
    fn run(mut self) {
        if let Some(permit) = self.permit.take() {
            run_delivery_pass(&self.core, permit);
        }
    }
}

impl<T> Drop for ScheduledPass<T> {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        warn!(
            event = events::PASS_ABANDONED,
            component = COMPONENT,
            subscription = %self.core.id(),
            "delivery pass dropped before it ran, releasing the pass marker"
        );
        self.core.lock_state().release_pass(permit);
    }
}

/// Hands the pass owning `permit` to the execution context.
pub(crate) fn dispatch_pass<T>(core: &Arc<SubscriptionCore<T>>, permit: PassPermit)
where
    T: Send + 'static,
{
    debug!(
        event = events::PASS_DISPATCHED,
        component = COMPONENT,
        subscription = %core.id(),
        "dispatching delivery pass"
    );

    let scheduled = ScheduledPass {
        core: Arc::clone(core),
        permit: Some(permit),
    };
    core.executor().execute(Box::new(move || scheduled.run()));
}

/// Runs passes back to back for as long as the decision re-arms one.
///
/// Looping here instead of re-submitting keeps the permit with this task and bounds the
/// stack no matter how many small requests arrive meanwhile.
pub(crate) fn run_delivery_pass<T>(core: &Arc<SubscriptionCore<T>>, mut permit: PassPermit)
where
    T: Send + 'static,
{
    loop {
        let batch = core.lock_state().take_batch(&permit);
        match batch {
            Batch::Deliver(payloads) => deliver_batch(core, payloads),
            Batch::Aborted => {
                debug!(
                    event = events::PASS_ABORTED,
                    component = COMPONENT,
                    subscription = %core.id(),
                    "subscription terminated before the pass started"
                );
            }
        }

        let decision = core.lock_state().finish_pass(permit);
        match decision {
            FlushDecision::Dispatch(next) => permit = next,
            FlushDecision::Complete => {
                core.complete_stream();
                return;
            }
            FlushDecision::Idle => {
                debug!(
                    event = events::PASS_FINISHED,
                    component = COMPONENT,
                    subscription = %core.id(),
                    "delivery pass finished"
                );
                return;
            }
        }
    }
}

/// Delivers `payloads` in order, re-checking termination before every item.
///
/// A panicking `on_next` ends the batch but not the pass: the rest of the batch is
/// discarded and the pass marker is released as usual.
fn deliver_batch<T>(core: &SubscriptionCore<T>, payloads: Vec<Payload<T>>) {
    debug!(
        event = events::PASS_BATCH_TAKEN,
        component = COMPONENT,
        subscription = %core.id(),
        batch_size = payloads.len(),
        "sending items to the subscriber"
    );

    let mut remaining = payloads.into_iter();
    while let Some(payload) = remaining.next() {
        if let Some(reason) = termination_reason(core) {
            discard_rest(core, iter::once(payload).chain(remaining), reason);
            return;
        }

        let subscriber = core.subscriber();
        if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_next(payload))) {
            let message = panic_message(cause.as_ref());
            error!(
                event = events::PASS_SUBSCRIBER_PANICKED,
                component = COMPONENT,
                subscription = %core.id(),
                panic = %message,
                "subscriber panicked in on_next"
            );
            discard_rest(core, remaining, SubscriptionError::SubscriberPanicked(message));
            return;
        }
        trace!(
            event = events::PASS_ITEM_DELIVERED,
            component = COMPONENT,
            subscription = %core.id(),
            "item delivered"
        );
    }
}

fn termination_reason<T>(core: &SubscriptionCore<T>) -> Option<SubscriptionError> {
    let state = core.lock_state();
    state.is_terminated().then(|| state.residual_reason())
}

fn discard_rest<T>(
    core: &SubscriptionCore<T>,
    rest: impl Iterator<Item = Payload<T>>,
    reason: SubscriptionError,
) {
    let undelivered: Vec<Payload<T>> = rest.collect();
    if !undelivered.is_empty() {
        warn!(
            event = events::PASS_INTERRUPTED,
            component = COMPONENT,
            subscription = %core.id(),
            undelivered = undelivered.len(),
            reason = %reason,
            "delivery interrupted, discarding the rest of the batch"
        );
    }
    discard_payloads(
        core.id(),
        undelivered
            .into_iter()
            .map(|payload| (payload, reason.clone())),
    );
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
