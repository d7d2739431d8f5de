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

//! Data-plane layer.
//!
//! Moves payloads: the delivery pass hands buffered payloads to the subscriber within
//! the granted demand, and the discard path completes every payload that will never be
//! delivered. Both run strictly outside the subscription's state lock.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use demand_subscription::{
//!     DemandSubscription, DetachedProducer, DropLatest, ImmediateExecutionContext, Payload,
//!     Subscriber, SubscriptionError,
//! };
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<u32>>);
//!
//! impl Subscriber<u32> for Collect {
//!     fn on_next(&self, payload: Payload<u32>) {
//!         self.0.lock().unwrap().push(*payload.item());
//!         payload.ack();
//!     }
//!     fn on_complete(&self) {}
//!     fn on_error(&self, _error: SubscriptionError) {}
//! }
//!
//! let collect = Arc::new(Collect::default());
//! let subscription = DemandSubscription::new(
//!     Arc::new(ImmediateExecutionContext),
//!     Arc::new(DetachedProducer),
//!     Box::new(DropLatest::new(2)),
//!     collect.clone(),
//! );
//!
//! let dropped = Arc::new(Mutex::new(Vec::new()));
//! for item in 0..3 {
//!     let dropped = dropped.clone();
//!     subscription.publish(Payload::new(item, move |item, error| {
//!         if error.is_some() {
//!             dropped.lock().unwrap().push(item);
//!         }
//!     }));
//! }
//!
//! subscription.request(5);
//! assert_eq!(*collect.0.lock().unwrap(), vec![0, 1]);
//! assert_eq!(*dropped.lock().unwrap(), vec![2]);
//! ```

pub(crate) mod delivery;
pub(crate) mod discard;
