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

//! Backpressure layer.
//!
//! Decides which published payloads stay buffered when supply outpaces demand. The
//! subscription owns the buffer and calls the active policy for every admission; the
//! policy only rearranges the buffer and reports what no longer fits.
//!
//! ```
//! use demand_subscription::{BackpressurePolicy, Buffer, DropLatest, Payload};
//!
//! let policy = DropLatest::new(1);
//! let mut buffer: Buffer<u32> = Buffer::new();
//!
//! assert!(policy.update(&mut buffer, Payload::detached(1)).is_empty());
//! let rejected = policy.update(&mut buffer, Payload::detached(2));
//! assert_eq!(*rejected[0].item(), 2);
//! ```

use crate::api::payload::Payload;
use std::collections::VecDeque;
use std::fmt::Display;

pub(crate) mod strategies;

/// FIFO of payloads waiting for demand, oldest at the front.
pub type Buffer<T> = VecDeque<Payload<T>>;

/// Admission rule applied to every published payload.
///
/// `update` runs while the subscription holds its state lock: it must not block, perform
/// I/O or call back into the subscription. It returns every payload that is not resident
/// in `buffer` afterwards, including `incoming` when it is rejected outright. The
/// `Display` form names the policy in discard reasons.
pub trait BackpressurePolicy<T>: Display + Send + Sync {
    fn update(&self, buffer: &mut Buffer<T>, incoming: Payload<T>) -> Vec<Payload<T>>;
}
