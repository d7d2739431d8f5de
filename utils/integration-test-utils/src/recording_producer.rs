use demand_subscription::{ProducerHandle, SubscriptionId};
use std::sync::Mutex;

/// Producer stand-in that remembers every unsubscribe call.
#[derive(Default)]
pub struct RecordingProducer {
    unsubscribed: Mutex<Vec<SubscriptionId>>,
}

impl RecordingProducer {
    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed
            .lock()
            .expect("producer log poisoned")
            .clone()
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribed().len()
    }
}

impl ProducerHandle for RecordingProducer {
    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.unsubscribed
            .lock()
            .expect("producer log poisoned")
            .push(subscription);
    }
}
