//! Mutable subscription state and its transitions.
//!
//! Every method runs under the subscription's state lock and only computes what has to
//! happen; callers perform the resulting notifications after releasing the lock.

use crate::api::payload::Payload;
use crate::backpressure::{BackpressurePolicy, Buffer};
use crate::control_plane::lifecycle::{Lifecycle, PassPermit, PassState, TerminationCause};
use crate::error::SubscriptionError;
use std::mem;

/// Outcome of the check-and-flush decision.
#[derive(Debug)]
pub(crate) enum FlushDecision {
    /// A delivery pass must run; the permit travels with it.
    Dispatch(PassPermit),
    /// The drain finished: the subscriber gets `on_complete`.
    Complete,
    /// Nothing to do until the next request, publish or pass end.
    Idle,
}

/// Payloads dequeued for one delivery pass.
pub(crate) enum Batch<T> {
    Deliver(Vec<Payload<T>>),
    Aborted,
}

pub(crate) struct SubscriptionState<T> {
    lifecycle: Lifecycle,
    cause: Option<TerminationCause>,
    pass: PassState,
    requested: u64,
    buffer: Buffer<T>,
}

impl<T> SubscriptionState<T> {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Active,
            cause: None,
            pass: PassState::Idle,
            requested: 0,
            buffer: Buffer::new(),
        }
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.lifecycle == Lifecycle::Terminated
    }

    pub(crate) fn requested(&self) -> u64 {
        self.requested
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Adds demand. Saturates at `u64::MAX`, which behaves as unbounded demand.
    pub(crate) fn add_demand(&mut self, n: u64) {
        self.requested = self.requested.saturating_add(n);
    }

    /// Runs the policy for an incoming payload and returns everything to discard.
    ///
    /// Once completion was signalled nothing is admitted and the payload comes straight
    /// back with [`SubscriptionError::Closed`].
    pub(crate) fn admit(
        &mut self,
        policy: &dyn BackpressurePolicy<T>,
        incoming: Payload<T>,
    ) -> Vec<(Payload<T>, SubscriptionError)> {
        if self.lifecycle != Lifecycle::Active {
            return vec![(incoming, SubscriptionError::Closed)];
        }

        let evicted = policy.update(&mut self.buffer, incoming);
        if evicted.is_empty() {
            return Vec::new();
        }

        let policy_name = policy.to_string();
        evicted
            .into_iter()
            .map(|payload| {
                (
                    payload,
                    SubscriptionError::DiscardedByPolicy {
                        policy: policy_name.clone(),
                    },
                )
            })
            .collect()
    }

    /// Moves an active subscription into the draining phase.
    pub(crate) fn begin_completion(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Active {
            return false;
        }
        self.lifecycle = Lifecycle::Terminating;
        true
    }

    /// Terminates immediately and hands back whatever was still buffered.
    ///
    /// Returns `None` when the subscription had already terminated, so each residual
    /// payload is handed out exactly once.
    pub(crate) fn terminate(&mut self, cause: TerminationCause) -> Option<Buffer<T>> {
        if self.is_terminated() {
            return None;
        }
        self.lifecycle = Lifecycle::Terminated;
        self.cause = Some(cause);
        Some(mem::take(&mut self.buffer))
    }

    /// Discard reason for payloads a pass dequeued but could not deliver.
    pub(crate) fn residual_reason(&self) -> SubscriptionError {
        self.cause
            .as_ref()
            .map(TerminationCause::residual_reason)
            .unwrap_or(SubscriptionError::Cancelled)
    }

    /// The check-and-flush decision.
    pub(crate) fn decide(&mut self) -> FlushDecision {
        if self.is_terminated() {
            return FlushDecision::Idle;
        }

        if self.pass == PassState::Idle && self.requested > 0 && !self.buffer.is_empty() {
            self.pass = PassState::Sending;
            return FlushDecision::Dispatch(PassPermit::mint());
        }

        // Completion waits for an idle pass so no `on_next` can trail `on_complete`.
        if self.lifecycle == Lifecycle::Terminating
            && self.pass == PassState::Idle
            && self.buffer.is_empty()
        {
            self.lifecycle = Lifecycle::Terminated;
            self.cause = Some(TerminationCause::Completed);
            return FlushDecision::Complete;
        }

        FlushDecision::Idle
    }

    /// Dequeues up to the outstanding demand for the pass owning `permit`.
    pub(crate) fn take_batch(&mut self, _permit: &PassPermit) -> Batch<T> {
        if self.is_terminated() {
            return Batch::Aborted;
        }

        let amount = usize::try_from(self.requested)
            .unwrap_or(usize::MAX)
            .min(self.buffer.len());
        // `amount` never exceeds `requested`, so the cast back cannot truncate.
        self.requested -= amount as u64;
        Batch::Deliver(self.buffer.drain(..amount).collect())
    }

    /// Ends the pass owning `permit` and immediately re-runs the decision.
    pub(crate) fn finish_pass(&mut self, permit: PassPermit) -> FlushDecision {
        self.release_pass(permit);
        self.decide()
    }

    /// Frees the pass marker of a pass that never ran.
    pub(crate) fn release_pass(&mut self, _permit: PassPermit) {
        self.pass = PassState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{Batch, FlushDecision, SubscriptionState};
    use crate::api::payload::Payload;
    use crate::backpressure::strategies::{DropLatest, Unbounded};
    use crate::control_plane::lifecycle::{Lifecycle, TerminationCause};
    use crate::error::SubscriptionError;

    fn state_with(items: &[u32]) -> SubscriptionState<u32> {
        let mut state = SubscriptionState::new();
        for item in items {
            assert!(state.admit(&Unbounded, Payload::detached(*item)).is_empty());
        }
        state
    }

    fn delivered(batch: Batch<u32>) -> Vec<u32> {
        match batch {
            Batch::Deliver(payloads) => payloads.iter().map(|p| *p.item()).collect(),
            Batch::Aborted => panic!("batch unexpectedly aborted"),
        }
    }

    #[test]
    fn no_pass_without_demand_or_items() {
        let mut empty = state_with(&[]);
        empty.add_demand(5);
        assert!(matches!(empty.decide(), FlushDecision::Idle));

        let mut starving = state_with(&[1]);
        assert!(matches!(starving.decide(), FlushDecision::Idle));
    }

    #[test]
    fn only_one_pass_is_dispatched_at_a_time() {
        let mut state = state_with(&[1, 2]);
        state.add_demand(1);

        let FlushDecision::Dispatch(permit) = state.decide() else {
            panic!("expected a pass");
        };
        assert!(matches!(state.decide(), FlushDecision::Idle));

        assert_eq!(delivered(state.take_batch(&permit)), vec![1]);
        state.add_demand(1);
        assert!(matches!(state.decide(), FlushDecision::Idle));
        let FlushDecision::Dispatch(next) = state.finish_pass(permit) else {
            panic!("remaining demand should re-arm the pass");
        };
        assert_eq!(delivered(state.take_batch(&next)), vec![2]);
        assert!(matches!(state.finish_pass(next), FlushDecision::Idle));
    }

    #[test]
    fn released_pass_can_be_dispatched_again() {
        let mut state = state_with(&[1]);
        state.add_demand(1);
        let FlushDecision::Dispatch(permit) = state.decide() else {
            panic!("expected a pass");
        };

        state.release_pass(permit);

        assert_eq!(state.requested(), 1);
        assert_eq!(state.buffered(), 1);
        assert!(matches!(state.decide(), FlushDecision::Dispatch(_)));
    }

    #[test]
    fn batch_is_bounded_by_demand_and_keeps_fifo_order() {
        let mut state = state_with(&[10, 20, 30]);
        state.add_demand(2);

        let FlushDecision::Dispatch(permit) = state.decide() else {
            panic!("expected a pass");
        };
        assert_eq!(delivered(state.take_batch(&permit)), vec![10, 20]);
        assert_eq!(state.requested(), 0);
        assert_eq!(state.buffered(), 1);
    }

    #[test]
    fn completion_waits_for_the_buffer_to_drain() {
        let mut state = state_with(&[1]);
        assert!(state.begin_completion());
        assert!(matches!(state.decide(), FlushDecision::Idle));
        assert_eq!(state.lifecycle(), Lifecycle::Terminating);

        state.add_demand(1);
        let FlushDecision::Dispatch(permit) = state.decide() else {
            panic!("expected a pass");
        };
        assert_eq!(delivered(state.take_batch(&permit)), vec![1]);
        // Completion is held back while the pass still owns the marker.
        assert!(matches!(state.decide(), FlushDecision::Idle));
        assert!(matches!(state.finish_pass(permit), FlushDecision::Complete));
        assert!(state.is_terminated());
        assert!(matches!(state.decide(), FlushDecision::Idle));
    }

    #[test]
    fn closed_subscription_rejects_new_items() {
        let mut state = state_with(&[]);
        state.begin_completion();

        let rejected = state.admit(&Unbounded, Payload::detached(4));
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].1, SubscriptionError::Closed);
    }

    #[test]
    fn policy_evictions_name_the_policy() {
        let mut state = state_with(&[]);
        let policy = DropLatest::new(1);

        assert!(state.admit(&policy, Payload::detached(1)).is_empty());
        let rejected = state.admit(&policy, Payload::detached(2));

        assert_eq!(*rejected[0].0.item(), 2);
        assert_eq!(
            rejected[0].1,
            SubscriptionError::DiscardedByPolicy {
                policy: "LATEST(1)".to_string()
            }
        );
    }

    #[test]
    fn terminate_drains_the_buffer_once() {
        let mut state = state_with(&[1, 2]);

        let drained = state.terminate(TerminationCause::Cancelled).expect("first");
        assert_eq!(drained.len(), 2);
        assert!(state.terminate(TerminationCause::Cancelled).is_none());
        assert_eq!(state.buffered(), 0);
    }

    #[test]
    fn running_pass_aborts_after_termination() {
        let mut state = state_with(&[1, 2]);
        state.add_demand(2);
        let FlushDecision::Dispatch(permit) = state.decide() else {
            panic!("expected a pass");
        };

        state.terminate(TerminationCause::Failed(SubscriptionError::InvalidDemand(0)));

        assert!(matches!(state.take_batch(&permit), Batch::Aborted));
        assert!(matches!(
            state.residual_reason(),
            SubscriptionError::Terminated(_)
        ));
        assert!(matches!(state.finish_pass(permit), FlushDecision::Idle));
    }

    #[test]
    fn demand_saturates_instead_of_overflowing() {
        let mut state = state_with(&[]);
        state.add_demand(u64::MAX);
        state.add_demand(10);
        assert_eq!(state.requested(), u64::MAX);
    }
}
