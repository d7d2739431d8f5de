//! Runtime integration layer.
//!
//! Isolates where delivery passes actually run so threading behavior stays localized
//! and the subscription core only ever sees the [`ExecutionContext`] trait.
//!
//! ```
//! use std::sync::mpsc;
//! use demand_subscription::{ExecutionContext, TokioExecutionContext};
//!
//! let (tx, rx) = mpsc::channel();
//! TokioExecutionContext::shared().execute(Box::new(move || tx.send("ran").unwrap()));
//! assert_eq!(rx.recv().unwrap(), "ran");
//! ```

pub(crate) mod delivery_runtime;
pub(crate) mod execution;
pub(crate) mod worker_runtime;

pub use execution::{
    ExecutionContext, ImmediateExecutionContext, Task, ThreadExecutionContext,
    TokioExecutionContext,
};
