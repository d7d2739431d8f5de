use demand_subscription::{Payload, Subscriber, SubscriptionError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::Duration;
use tracing::trace;

type NextHook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// One subscriber callback, as observed.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal<T> {
    Next(T),
    Complete,
    Error(SubscriptionError),
}

/// Subscriber that records every signal, acknowledges every payload and tracks how many
/// `on_next` calls overlap.
pub struct RecordingSubscriber<T> {
    signals: Mutex<Vec<Signal<T>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
    on_next_hook: OnceLock<NextHook<T>>,
}

impl<T> Default for RecordingSubscriber<T> {
    fn default() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: None,
            on_next_hook: OnceLock::new(),
        }
    }
}

impl<T: Clone> RecordingSubscriber<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `delay` inside every `on_next`, widening race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Runs `hook` on every item before it is acknowledged. Can be set once.
    pub fn set_on_next_hook(&self, hook: impl Fn(&T) + Send + Sync + 'static) {
        if self.on_next_hook.set(Box::new(hook)).is_err() {
            panic!("on_next hook already installed");
        }
    }

    pub fn signals(&self) -> Vec<Signal<T>> {
        self.lock().clone()
    }

    pub fn delivered(&self) -> Vec<T> {
        self.lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Next(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.lock()
            .iter()
            .filter(|signal| matches!(signal, Signal::Complete))
            .count()
    }

    pub fn errors(&self) -> Vec<SubscriptionError> {
        self.lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Error(error) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether `on_complete` or `on_error` was observed.
    pub fn is_finished(&self) -> bool {
        self.lock()
            .iter()
            .any(|signal| !matches!(signal, Signal::Next(_)))
    }

    /// Highest number of `on_next` calls observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Signal<T>>> {
        self.signals.lock().expect("signal log poisoned")
    }
}

impl<T: Clone + Send + Sync> Subscriber<T> for RecordingSubscriber<T> {
    fn on_next(&self, payload: Payload<T>) {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.lock().push(Signal::Next(payload.item().clone()));
        if let Some(hook) = self.on_next_hook.get() {
            hook(payload.item());
        }
        trace!(in_flight = running, "recording subscriber acknowledging item");

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        payload.ack();
    }

    fn on_complete(&self) {
        self.lock().push(Signal::Complete);
    }

    fn on_error(&self, error: SubscriptionError) {
        self.lock().push(Signal::Error(error));
    }
}
