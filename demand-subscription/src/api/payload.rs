//! Items travelling through a subscription together with their completion callback.

use crate::error::SubscriptionError;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Completion callback carried by every [`Payload`].
///
/// Called with `None` once the item was handed to the subscriber and acknowledged, or
/// with the reason the item was dropped.
pub type Callback<T> = Box<dyn FnOnce(T, Option<SubscriptionError>) + Send + 'static>;

/// An item plus the callback that must learn its fate exactly once.
///
/// Every way of finishing a payload takes it by value, so a payload can be acknowledged
/// or discarded at most once. A payload dropped without being finished, for instance by
/// a subscriber that panics, reports [`SubscriptionError::Abandoned`].
pub struct Payload<T> {
    // `None` only once the callback ran.
    pending: Option<(T, Callback<T>)>,
}

impl<T> Payload<T> {
    pub fn new<F>(item: T, callback: F) -> Self
    where
        F: FnOnce(T, Option<SubscriptionError>) + Send + 'static,
    {
        Self {
            pending: Some((item, Box::new(callback))),
        }
    }

    /// Wraps an item whose producer does not care about the outcome.
    pub fn detached(item: T) -> Self {
        Self::new(item, |_item, _error| {})
    }

    pub fn item(&self) -> &T {
        match &self.pending {
            Some((item, _)) => item,
            None => unreachable!("payload finished but still reachable"),
        }
    }

    /// Reports successful processing to the producer.
    pub fn ack(self) {
        self.complete(None);
    }

    /// Reports that the item will not be processed.
    pub fn discard(self, reason: SubscriptionError) {
        self.complete(Some(reason));
    }

    pub fn complete(mut self, error: Option<SubscriptionError>) {
        self.resolve(error);
    }

    fn resolve(&mut self, error: Option<SubscriptionError>) {
        if let Some((item, callback)) = self.pending.take() {
            callback(item, error);
        }
    }
}

impl<T> Drop for Payload<T> {
    fn drop(&mut self) {
        self.resolve(Some(SubscriptionError::Abandoned));
    }
}

impl<T: Debug> Debug for Payload<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("item", self.item())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Payload;
    use crate::error::SubscriptionError;
    use std::sync::{Arc, Mutex};

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

    #[test]
    fn ack_hands_the_item_back_without_error() {
        let outcomes: Outcomes = Arc::default();
        recorded_payload(7, &outcomes).ack();

        assert_eq!(*outcomes.lock().expect("lock outcomes"), vec![(7, None)]);
    }

    #[test]
    fn discard_reports_the_reason() {
        let outcomes: Outcomes = Arc::default();
        recorded_payload(3, &outcomes).discard(SubscriptionError::Cancelled);

        assert_eq!(
            *outcomes.lock().expect("lock outcomes"),
            vec![(3, Some(SubscriptionError::Cancelled))]
        );
    }

    #[test]
    fn dropping_an_unfinished_payload_reports_it_abandoned() {
        let outcomes: Outcomes = Arc::default();
        drop(recorded_payload(5, &outcomes));

        assert_eq!(
            *outcomes.lock().expect("lock outcomes"),
            vec![(5, Some(SubscriptionError::Abandoned))]
        );
    }

    #[test]
    fn finished_payload_does_not_report_again_on_drop() {
        let outcomes: Outcomes = Arc::default();
        recorded_payload(6, &outcomes).ack();
        recorded_payload(8, &outcomes).discard(SubscriptionError::Closed);

        assert_eq!(
            *outcomes.lock().expect("lock outcomes"),
            vec![(6, None), (8, Some(SubscriptionError::Closed))]
        );
    }

    #[test]
    fn debug_shows_the_item_only() {
        let payload = Payload::detached("hello");
        assert_eq!(format!("{payload:?}"), "Payload { item: \"hello\", .. }");
        assert_eq!(*payload.item(), "hello");
    }
}
