//! Shared tokio runtime backing [`crate::TokioExecutionContext::shared`].

use lazy_static::lazy_static;
use tokio::runtime::{Handle, Runtime};

const THREAD_NUM: usize = 4;
const MAX_BLOCKING_THREADS: usize = 64;

lazy_static! {
    static ref DELIVERY_RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(THREAD_NUM)
        .max_blocking_threads(MAX_BLOCKING_THREADS)
        .thread_name("demand-delivery")
        .enable_all()
        .build()
        .expect("Unable to create delivery runtime");
}

pub(crate) fn delivery_runtime_handle() -> Handle {
    DELIVERY_RUNTIME.handle().clone()
}
