//! Runtime helper for running delivery passes on dedicated OS threads.

use std::thread;
use tracing::trace;

pub(crate) fn spawn_delivery_thread<F>(pass: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::spawn(move || {
        trace!("Within delivery thread");
        pass();
    });
}
