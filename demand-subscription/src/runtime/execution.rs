//! Execution contexts that run delivery passes off the signalling thread.

use crate::runtime::delivery_runtime::delivery_runtime_handle;
use crate::runtime::worker_runtime::spawn_delivery_thread;
use std::fmt;
use std::fmt::{Debug, Formatter};
use tokio::runtime::Handle;

/// One unit of delivery work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Asynchronous work-runner for delivery passes.
///
/// `execute` must not wait for the task to finish. No ordering is assumed between tasks;
/// the subscription itself guarantees that at most one of its passes is outstanding.
pub trait ExecutionContext: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs passes on the blocking pool of a tokio runtime.
///
/// Subscriber callbacks are synchronous and may take a while, so passes never occupy an
/// async worker thread.
#[derive(Clone)]
pub struct TokioExecutionContext {
    handle: Handle,
}

impl TokioExecutionContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Uses a process-wide delivery runtime that is built on first use.
    pub fn shared() -> Self {
        Self::new(delivery_runtime_handle())
    }
}

impl ExecutionContext for TokioExecutionContext {
    fn execute(&self, task: Task) {
        // The join handle is not needed: a pass reports back through the subscription.
        let _ = self.handle.spawn_blocking(task);
    }
}

impl Debug for TokioExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioExecutionContext")
            .finish_non_exhaustive()
    }
}

/// Starts a detached OS thread for every pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadExecutionContext;

impl ExecutionContext for ThreadExecutionContext {
    fn execute(&self, task: Task) {
        spawn_delivery_thread(task);
    }
}

/// Runs the pass on the calling thread before `execute` returns.
///
/// Deterministic, which makes it handy in tests and benchmarks. Every subscription
/// operation that schedules a pass then delivers before returning.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateExecutionContext;

impl ExecutionContext for ImmediateExecutionContext {
    fn execute(&self, task: Task) {
        task();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ExecutionContext, ImmediateExecutionContext, ThreadExecutionContext,
        TokioExecutionContext,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn immediate_context_runs_before_returning() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        ImmediateExecutionContext.execute(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn thread_context_runs_on_another_thread() {
        let (tx, rx) = mpsc::channel();
        let caller = std::thread::current().id();

        ThreadExecutionContext.execute(Box::new(move || {
            tx.send(std::thread::current().id()).expect("send thread id");
        }));

        let runner = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task should run");
        assert_ne!(runner, caller);
    }

    #[test]
    fn shared_tokio_context_runs_tasks() {
        let (tx, rx) = mpsc::channel();

        TokioExecutionContext::shared().execute(Box::new(move || {
            tx.send(()).expect("send completion");
        }));

        rx.recv_timeout(Duration::from_secs(5))
            .expect("task should run on the shared runtime");
    }

    #[test]
    fn try_current_is_none_outside_a_runtime() {
        assert!(TokioExecutionContext::try_current().is_none());
    }

    #[tokio::test]
    async fn try_current_picks_up_the_test_runtime() {
        assert!(TokioExecutionContext::try_current().is_some());
    }
}
