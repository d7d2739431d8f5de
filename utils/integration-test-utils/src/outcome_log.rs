use demand_subscription::{Payload, SubscriptionError};
use std::sync::{Arc, Mutex, MutexGuard};

/// Records how every payload it minted was resolved.
///
/// Each entry is `(item, None)` for a delivery acknowledgement or `(item, Some(reason))`
/// for a discard.
pub struct OutcomeLog<T> {
    entries: Arc<Mutex<Vec<(T, Option<SubscriptionError>)>>>,
}

impl<T> Clone for OutcomeLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for OutcomeLog<T> {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
        }
    }
}

impl<T: Clone + Send + 'static> OutcomeLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload whose callback appends to this log.
    pub fn payload(&self, item: T) -> Payload<T> {
        let entries = Arc::clone(&self.entries);
        Payload::new(item, move |item, error| {
            entries
                .lock()
                .expect("outcome log poisoned")
                .push((item, error));
        })
    }

    pub fn entries(&self) -> Vec<(T, Option<SubscriptionError>)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Items acknowledged as delivered, in callback order.
    pub fn acked(&self) -> Vec<T> {
        self.lock()
            .iter()
            .filter(|(_, error)| error.is_none())
            .map(|(item, _)| item.clone())
            .collect()
    }

    /// Items discarded together with their reasons, in callback order.
    pub fn discarded(&self) -> Vec<(T, SubscriptionError)> {
        self.lock()
            .iter()
            .filter_map(|(item, error)| error.clone().map(|error| (item.clone(), error)))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(T, Option<SubscriptionError>)>> {
        self.entries.lock().expect("outcome log poisoned")
    }
}
