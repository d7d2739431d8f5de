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

//! # demand-subscription
//!
//! `demand-subscription` mediates between a producer that publishes items and a
//! subscriber that asks for them. Items are buffered until the subscriber grants demand,
//! delivered in publish order by at most one delivery pass at a time, and every item is
//! resolved exactly once through the callback it was published with.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use demand_subscription::{
//!     DemandSubscription, DetachedProducer, ImmediateExecutionContext, Payload, Subscriber,
//!     SubscriptionError, Unbounded,
//! };
//!
//! #[derive(Default)]
//! struct Printer {
//!     lines: Mutex<Vec<String>>,
//! }
//!
//! impl Subscriber<&'static str> for Printer {
//!     fn on_next(&self, payload: Payload<&'static str>) {
//!         self.lines.lock().unwrap().push(payload.item().to_string());
//!         payload.ack();
//!     }
//!     fn on_complete(&self) {
//!         self.lines.lock().unwrap().push("done".to_string());
//!     }
//!     fn on_error(&self, error: SubscriptionError) {
//!         self.lines.lock().unwrap().push(error.to_string());
//!     }
//! }
//!
//! let printer = Arc::new(Printer::default());
//! let subscription = DemandSubscription::new(
//!     Arc::new(ImmediateExecutionContext),
//!     Arc::new(DetachedProducer),
//!     Box::new(Unbounded),
//!     printer.clone(),
//! );
//!
//! subscription.publish(Payload::detached("a"));
//! subscription.publish(Payload::detached("b"));
//! subscription.request(1);
//! assert_eq!(*printer.lines.lock().unwrap(), ["a"]);
//!
//! subscription.signal_completion();
//! subscription.request(1);
//! assert_eq!(*printer.lines.lock().unwrap(), ["a", "b", "done"]);
//! ```
//!
//! ## Configuration
//!
//! Subscriptions can also be built from a JSON [`SubscriptionConfig`]:
//!
//! ```
//! use std::sync::Arc;
//! use demand_subscription::{
//!     DemandSubscription, DetachedProducer, ImmediateExecutionContext, Payload, Subscriber,
//!     SubscriptionConfig, SubscriptionError,
//! };
//!
//! struct Sink;
//!
//! impl Subscriber<u32> for Sink {
//!     fn on_next(&self, payload: Payload<u32>) {
//!         payload.ack();
//!     }
//!     fn on_complete(&self) {}
//!     fn on_error(&self, _error: SubscriptionError) {}
//! }
//!
//! let config = SubscriptionConfig::from_json_str(
//!     r#"{"backpressure": {"strategy": "oldest", "capacity": 2}}"#,
//! )
//! .unwrap();
//! let subscription: DemandSubscription<u32> = DemandSubscription::from_config(
//!     &config,
//!     Arc::new(ImmediateExecutionContext),
//!     Arc::new(DetachedProducer),
//!     Arc::new(Sink),
//! )
//! .unwrap();
//!
//! assert_eq!(subscription.backpressure_policy(), "OLDEST(2)");
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: payloads, the subscriber contract and the producer handle
//! - Control plane: lifecycle states and the lock-guarded subscription state
//! - Backpressure: admission policies applied to the buffer
//! - Data plane: delivery passes and discard notification
//! - Runtime: execution contexts that run delivery passes
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not unconditionally initialize a global
//! subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod api;
pub use api::payload::{Callback, Payload};
pub use api::producer::{DetachedProducer, ProducerHandle, SubscriptionId};
pub use api::subscriber::Subscriber;

mod backpressure;
pub use backpressure::strategies::{DropLatest, DropOldest, Unbounded};
pub use backpressure::{BackpressurePolicy, Buffer};

mod config;
pub use config::{BackpressureConfig, BackpressureStrategy, SubscriptionConfig};

mod control_plane;
pub use control_plane::lifecycle::Lifecycle;

mod data_plane;

mod error;
pub use error::{ConfigError, SubscriptionError};

#[doc(hidden)]
pub mod observability;

mod runtime;
pub use runtime::{
    ExecutionContext, ImmediateExecutionContext, Task, ThreadExecutionContext,
    TokioExecutionContext,
};

mod subscription;
pub use subscription::DemandSubscription;
