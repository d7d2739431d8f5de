/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::api::payload::Payload;
use crate::api::producer::{ProducerHandle, SubscriptionId};
use crate::api::subscriber::Subscriber;
use crate::backpressure::BackpressurePolicy;
use crate::config::SubscriptionConfig;
use crate::control_plane::lifecycle::{Lifecycle, TerminationCause};
use crate::control_plane::state::{FlushDecision, SubscriptionState};
use crate::data_plane::delivery::dispatch_pass;
use crate::data_plane::discard::{discard_buffer, discard_payloads};
use crate::error::{ConfigError, SubscriptionError};
use crate::observability::events;
use crate::runtime::ExecutionContext;
use arc_swap::ArcSwap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const COMPONENT: &str = "subscription";

type SharedPolicy<T> = ArcSwap<Box<dyn BackpressurePolicy<T>>>;

/// Shared state of one subscription, referenced by its handles and running pass.
pub(crate) struct SubscriptionCore<T> {
    id: SubscriptionId,
    state: Mutex<SubscriptionState<T>>,
    policy: SharedPolicy<T>,
    subscriber: Arc<dyn Subscriber<T>>,
    producer: Arc<dyn ProducerHandle>,
    executor: Arc<dyn ExecutionContext>,
    detached: AtomicBool,
}

impl<T> SubscriptionCore<T> {
    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn subscriber(&self) -> &dyn Subscriber<T> {
        self.subscriber.as_ref()
    }

    pub(crate) fn executor(&self) -> &dyn ExecutionContext {
        self.executor.as_ref()
    }

    /// Short exclusive section over the mutable state.
    ///
    /// Nothing runs foreign code while holding the lock except the backpressure policy,
    /// so a poisoned lock still guards consistent state and is recovered.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SubscriptionState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tells the producer to stop routing to this subscription, once.
    fn detach_producer(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(
            event = events::PRODUCER_DETACHED,
            component = COMPONENT,
            subscription = %self.id,
            "unsubscribing from producer"
        );
        self.producer.unsubscribe(self.id);
    }

    /// Emits the normal end of stream after the decision switched to terminated.
    pub(crate) fn complete_stream(&self) {
        info!(
            event = events::STREAM_COMPLETED,
            component = COMPONENT,
            subscription = %self.id,
            "subscription drained, completing stream"
        );
        self.detach_producer();
        self.subscriber.on_complete();
    }

    /// Terminates with a stream-level error unless already terminated.
    fn fail_stream(&self, error: SubscriptionError) {
        let Some(residual) = self
            .lock_state()
            .terminate(TerminationCause::Failed(error.clone()))
        else {
            debug!(
                event = events::STREAM_FAILED,
                component = COMPONENT,
                subscription = %self.id,
                err = %error,
                "already terminated, not signalling again"
            );
            return;
        };

        warn!(
            event = events::STREAM_FAILED,
            component = COMPONENT,
            subscription = %self.id,
            err = %error,
            residual = residual.len(),
            "terminating stream with error"
        );
        self.detach_producer();
        let reason = SubscriptionError::Terminated(error.to_string());
        self.subscriber.on_error(error);
        discard_buffer(self.id, residual, &reason);
    }
}

impl<T: Send + 'static> SubscriptionCore<T> {
    /// Check-and-flush: starts a pass or completes the stream when due.
    fn check_and_flush(self: &Arc<Self>) {
        let decision = self.lock_state().decide();
        match decision {
            FlushDecision::Dispatch(permit) => dispatch_pass(self, permit),
            FlushDecision::Complete => self.complete_stream(),
            FlushDecision::Idle => {}
        }
    }
}

/// Demand-mediated delivery subscription between one producer and one subscriber.
///
/// Items are delivered in publish order, never beyond the demand granted through
/// [`request`](Self::request), by at most one delivery pass at a time running on the
/// configured [`ExecutionContext`]. Every published payload ends up either delivered or
/// discarded through its own callback with a reason.
///
/// The handle is cheap to clone; all clones drive the same subscription.
pub struct DemandSubscription<T> {
    core: Arc<SubscriptionCore<T>>,
}

impl<T> Clone for DemandSubscription<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Send + 'static> DemandSubscription<T> {
    pub fn new(
        executor: Arc<dyn ExecutionContext>,
        producer: Arc<dyn ProducerHandle>,
        policy: Box<dyn BackpressurePolicy<T>>,
        subscriber: Arc<dyn Subscriber<T>>,
    ) -> Self {
        let id = SubscriptionId::generate();
        debug!(
            component = COMPONENT,
            subscription = %id,
            policy = %policy,
            "subscription created"
        );

        Self {
            core: Arc::new(SubscriptionCore {
                id,
                state: Mutex::new(SubscriptionState::new()),
                policy: ArcSwap::from_pointee(policy),
                subscriber,
                producer,
                executor,
                detached: AtomicBool::new(false),
            }),
        }
    }

    /// Builds the policy from `config` and issues its initial request, if any.
    pub fn from_config(
        config: &SubscriptionConfig,
        executor: Arc<dyn ExecutionContext>,
        producer: Arc<dyn ProducerHandle>,
        subscriber: Arc<dyn Subscriber<T>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = config.backpressure.build()?;
        let subscription = Self::new(executor, producer, policy, subscriber);

        if let Some(initial) = config.initial_request {
            subscription.request(i64::try_from(initial).unwrap_or(i64::MAX));
        }

        Ok(subscription)
    }

    /// Grants `n` more items of demand.
    ///
    /// A non-positive `n` violates the protocol: the subscription terminates, the
    /// subscriber gets [`SubscriptionError::InvalidDemand`] and buffered payloads are
    /// discarded instead of delivered.
    pub fn request(&self, n: i64) {
        debug!(
            event = events::DEMAND_REQUESTED,
            component = COMPONENT,
            subscription = %self.core.id,
            n,
            "requested events from subscriber"
        );

        if n <= 0 {
            warn!(
                event = events::DEMAND_INVALID,
                component = COMPONENT,
                subscription = %self.core.id,
                n,
                "non-positive demand is a protocol violation"
            );
            self.core.fail_stream(SubscriptionError::InvalidDemand(n));
            return;
        }

        // `n > 0` was checked above.
        self.core.lock_state().add_demand(n as u64);
        self.core.check_and_flush();
    }

    /// Offers a payload to the subscription.
    ///
    /// While active the backpressure policy decides admission; anything it evicts is
    /// discarded with a reason naming the policy. Once completion was signalled or the
    /// subscription ended, the payload is discarded with [`SubscriptionError::Closed`].
    pub fn publish(&self, payload: Payload<T>) {
        let discarded = {
            let mut state = self.core.lock_state();
            let policy = self.core.policy.load();
            state.admit(&***policy, payload)
        };

        if discarded.is_empty() {
            debug!(
                event = events::PUBLISH_ADMITTED,
                component = COMPONENT,
                subscription = %self.core.id,
                "payload buffered"
            );
        } else if discarded
            .iter()
            .all(|(_, reason)| *reason == SubscriptionError::Closed)
        {
            debug!(
                event = events::PUBLISH_REJECTED_CLOSED,
                component = COMPONENT,
                subscription = %self.core.id,
                "payload published after the subscription closed"
            );
        }

        discard_payloads(self.core.id, discarded);
        self.core.check_and_flush();
    }

    /// Announces that no more items will be published.
    ///
    /// The buffer keeps draining against demand; `on_complete` follows the last
    /// delivered item.
    pub fn signal_completion(&self) {
        if self.core.lock_state().begin_completion() {
            info!(
                event = events::COMPLETION_SIGNALLED,
                component = COMPONENT,
                subscription = %self.core.id,
                "completion signalled, draining buffer"
            );
        }
        self.core.check_and_flush();
    }

    /// Terminates the stream because the producer failed.
    ///
    /// The subscriber gets [`SubscriptionError::Upstream`]; buffered payloads are
    /// discarded with [`SubscriptionError::Terminated`].
    pub fn signal_error(&self, reason: impl Into<String>) {
        self.core
            .fail_stream(SubscriptionError::Upstream(reason.into()));
    }

    /// Stops the subscription on behalf of the subscriber.
    ///
    /// The producer is told first. Every buffered payload is discarded with
    /// [`SubscriptionError::Cancelled`] before this returns, and a running pass stops
    /// after its current item. Calling it again is a no-op.
    pub fn cancel(&self) {
        self.core.detach_producer();

        let Some(residual) = self.core.lock_state().terminate(TerminationCause::Cancelled)
        else {
            return;
        };

        info!(
            event = events::SUBSCRIPTION_CANCELLED,
            component = COMPONENT,
            subscription = %self.core.id,
            residual = residual.len(),
            "subscription cancelled"
        );
        discard_buffer(self.core.id, residual, &SubscriptionError::Cancelled);
    }

    /// Replaces the backpressure policy; applies from the next `publish` on.
    pub fn set_backpressure_policy(&self, policy: Box<dyn BackpressurePolicy<T>>) {
        info!(
            event = events::POLICY_SWAPPED,
            component = COMPONENT,
            subscription = %self.core.id,
            policy = %policy,
            "backpressure policy replaced"
        );
        self.core.policy.store(Arc::new(policy));
    }
}

impl<T> DemandSubscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.core.id
    }

    /// Outstanding demand not yet consumed by a pass.
    pub fn requested(&self) -> u64 {
        self.core.lock_state().requested()
    }

    /// Number of payloads waiting for demand.
    pub fn buffered(&self) -> usize {
        self.core.lock_state().buffered()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lock_state().lifecycle()
    }

    pub fn is_terminated(&self) -> bool {
        self.core.lock_state().is_terminated()
    }

    /// Display name of the active backpressure policy.
    pub fn backpressure_policy(&self) -> String {
        self.core.policy.load().to_string()
    }

    #[cfg(test)]
    pub(crate) fn core(&self) -> &Arc<SubscriptionCore<T>> {
        &self.core
    }
}

impl<T> Debug for DemandSubscription<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.core.lock_state();
        f.debug_struct("DemandSubscription")
            .field("id", &self.core.id)
            .field("lifecycle", &state.lifecycle())
            .field("requested", &state.requested())
            .field("buffered", &state.buffered())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::DemandSubscription;
    use crate::api::payload::Payload;
    use crate::api::producer::{ProducerHandle, SubscriptionId};
    use crate::api::subscriber::Subscriber;
    use crate::backpressure::strategies::{DropLatest, DropOldest, Unbounded};
    use crate::control_plane::lifecycle::Lifecycle;
    use crate::error::SubscriptionError;
    use crate::runtime::ImmediateExecutionContext;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum Seen {
        Next(u32),
        Complete,
        Error(SubscriptionError),
    }

    #[derive(Default)]
    struct RecordingSubscriber {
        seen: Mutex<Vec<Seen>>,
    }

    impl RecordingSubscriber {
        fn seen(&self) -> std::sync::MutexGuard<'_, Vec<Seen>> {
            self.seen.lock().expect("lock seen")
        }
    }

    impl Subscriber<u32> for RecordingSubscriber {
        fn on_next(&self, payload: Payload<u32>) {
            self.seen().push(Seen::Next(*payload.item()));
            payload.ack();
        }

        fn on_complete(&self) {
            self.seen().push(Seen::Complete);
        }

        fn on_error(&self, error: SubscriptionError) {
            self.seen().push(Seen::Error(error));
        }
    }

    #[derive(Default)]
    struct CountingProducer {
        unsubscribed: Mutex<Vec<SubscriptionId>>,
    }

    impl ProducerHandle for CountingProducer {
        fn unsubscribe(&self, subscription: SubscriptionId) {
            self.unsubscribed
                .lock()
                .expect("lock unsubscribed")
                .push(subscription);
        }
    }

    type Outcomes = Arc<Mutex<Vec<(u32, Option<SubscriptionError>)>>>;

    fn recorded_payload(item: u32, outcomes: &Outcomes) -> Payload<u32> {
        let outcomes = outcomes.clone();
        Payload::new(item, move |item, error| {
            outcomes
                .lock()
                .expect("lock outcomes")
                .push((item, error));
        })
    }

    struct Fixture {
        subscription: DemandSubscription<u32>,
        subscriber: Arc<RecordingSubscriber>,
        producer: Arc<CountingProducer>,
        outcomes: Outcomes,
    }

    impl Fixture {
        fn new() -> Self {
            let subscriber = Arc::new(RecordingSubscriber::default());
            let producer = Arc::new(CountingProducer::default());
            let subscription = DemandSubscription::new(
                Arc::new(ImmediateExecutionContext),
                producer.clone(),
                Box::new(Unbounded),
                subscriber.clone(),
            );
            Self {
                subscription,
                subscriber,
                producer,
                outcomes: Arc::default(),
            }
        }

        fn publish(&self, item: u32) {
            self.subscription
                .publish(recorded_payload(item, &self.outcomes));
        }

        fn outcomes(&self) -> Vec<(u32, Option<SubscriptionError>)> {
            self.outcomes.lock().expect("lock outcomes").clone()
        }

        fn unsubscribe_count(&self) -> usize {
            self.producer
                .unsubscribed
                .lock()
                .expect("lock unsubscribed")
                .len()
        }
    }

    #[test]
    fn request_two_of_three_leaves_the_last_buffered() {
        let fixture = Fixture::new();
        for item in [1, 2, 3] {
            fixture.publish(item);
        }

        fixture.subscription.request(2);

        assert_eq!(*fixture.subscriber.seen(), vec![Seen::Next(1), Seen::Next(2)]);
        assert_eq!(fixture.subscription.requested(), 0);
        assert_eq!(fixture.subscription.buffered(), 1);
    }

    #[test]
    fn completion_follows_the_last_delivery() {
        let fixture = Fixture::new();
        fixture.publish(1);
        fixture.subscription.request(1);
        fixture.subscription.signal_completion();

        assert_eq!(*fixture.subscriber.seen(), vec![Seen::Next(1), Seen::Complete]);
        assert_eq!(fixture.subscription.lifecycle(), Lifecycle::Terminated);
        assert_eq!(fixture.unsubscribe_count(), 1);
    }

    #[test]
    fn non_positive_demand_fails_the_stream_once() {
        let fixture = Fixture::new();
        fixture.publish(1);

        fixture.subscription.request(0);
        fixture.subscription.request(-1);
        fixture.subscription.request(5);

        assert_eq!(
            *fixture.subscriber.seen(),
            vec![Seen::Error(SubscriptionError::InvalidDemand(0))]
        );
        assert!(matches!(
            fixture.outcomes().as_slice(),
            [(1, Some(SubscriptionError::Terminated(_)))]
        ));
        assert_eq!(fixture.unsubscribe_count(), 1);
    }

    #[test]
    fn cancel_discards_buffer_and_is_idempotent() {
        let fixture = Fixture::new();
        fixture.publish(1);
        fixture.publish(2);

        fixture.subscription.cancel();
        fixture.subscription.cancel();
        fixture.subscription.request(1);

        assert!(fixture.subscriber.seen().is_empty());
        assert_eq!(
            fixture.outcomes(),
            vec![
                (1, Some(SubscriptionError::Cancelled)),
                (2, Some(SubscriptionError::Cancelled)),
            ]
        );
        assert_eq!(fixture.unsubscribe_count(), 1);
    }

    #[test]
    fn publish_after_completion_is_closed() {
        let fixture = Fixture::new();
        fixture.subscription.signal_completion();
        fixture.publish(9);

        assert_eq!(fixture.outcomes(), vec![(9, Some(SubscriptionError::Closed))]);
        assert_eq!(*fixture.subscriber.seen(), vec![Seen::Complete]);
    }

    #[test]
    fn upstream_error_reaches_subscriber_and_discards_buffer() {
        let fixture = Fixture::new();
        fixture.publish(4);

        fixture.subscription.signal_error("connection reset");
        fixture.subscription.signal_completion();

        assert_eq!(
            *fixture.subscriber.seen(),
            vec![Seen::Error(SubscriptionError::Upstream(
                "connection reset".to_string()
            ))]
        );
        assert!(matches!(
            fixture.outcomes().as_slice(),
            [(4, Some(SubscriptionError::Terminated(_)))]
        ));
    }

    #[test]
    fn swapped_policy_applies_to_the_next_publish() {
        let fixture = Fixture::new();
        fixture.publish(1);
        fixture.publish(2);

        fixture
            .subscription
            .set_backpressure_policy(Box::new(DropOldest::new(2)));
        assert_eq!(fixture.subscription.backpressure_policy(), "OLDEST(2)");
        fixture.publish(3);

        assert_eq!(
            fixture.outcomes(),
            vec![(
                1,
                Some(SubscriptionError::DiscardedByPolicy {
                    policy: "OLDEST(2)".to_string()
                })
            )]
        );

        fixture
            .subscription
            .set_backpressure_policy(Box::new(DropLatest::new(2)));
        fixture.publish(4);
        fixture.subscription.request(10);

        assert_eq!(*fixture.subscriber.seen(), vec![Seen::Next(2), Seen::Next(3)]);
        assert_eq!(fixture.outcomes().len(), 4);
    }

    #[test]
    fn debug_reports_state_snapshot() {
        let fixture = Fixture::new();
        fixture.publish(1);

        let rendered = format!("{:?}", fixture.subscription);
        assert!(rendered.contains("buffered: 1"));
        assert!(rendered.contains("lifecycle: Active"));
    }
}
