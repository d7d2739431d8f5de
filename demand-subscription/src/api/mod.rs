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

//! API facade layer.
//!
//! The contracts a subscription exchanges with the outside world: the payloads it
//! carries, the subscriber it feeds and the producer it reports back to.
//!
//! ```
//! use demand_subscription::{Payload, SubscriptionError};
//!
//! let payload = Payload::new("reading-42", |item, error: Option<SubscriptionError>| {
//!     match error {
//!         None => println!("{item} delivered"),
//!         Some(reason) => println!("{item} dropped: {reason}"),
//!     }
//! });
//! payload.ack();
//! ```

pub mod payload;
pub mod producer;
pub mod subscriber;
