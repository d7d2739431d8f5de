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

//! Control-plane layer.
//!
//! Owns the subscription lifecycle (`Active -> Terminating -> Terminated`), the demand
//! counter and the single-pass marker. Transitions only compute what must happen; the
//! notifications they imply are performed by the caller after the state lock is gone.
//!
//! ```
//! use std::sync::Arc;
//! use demand_subscription::{
//!     DemandSubscription, DetachedProducer, ImmediateExecutionContext, Lifecycle, Payload,
//!     Subscriber, SubscriptionError, Unbounded,
//! };
//!
//! struct Printer;
//!
//! impl Subscriber<&'static str> for Printer {
//!     fn on_next(&self, payload: Payload<&'static str>) {
//!         println!("got {}", payload.item());
//!         payload.ack();
//!     }
//!     fn on_complete(&self) {}
//!     fn on_error(&self, _error: SubscriptionError) {}
//! }
//!
//! let subscription = DemandSubscription::new(
//!     Arc::new(ImmediateExecutionContext),
//!     Arc::new(DetachedProducer),
//!     Box::new(Unbounded),
//!     Arc::new(Printer),
//! );
//!
//! subscription.publish(Payload::detached("a"));
//! subscription.signal_completion();
//! // Completion waits until the buffered item was delivered.
//! assert_eq!(subscription.lifecycle(), Lifecycle::Terminating);
//!
//! subscription.request(1);
//! assert_eq!(subscription.lifecycle(), Lifecycle::Terminated);
//! ```

pub(crate) mod lifecycle;
pub(crate) mod state;
