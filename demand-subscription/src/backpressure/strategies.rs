//! Reference backpressure policies.

use crate::api::payload::Payload;
use crate::backpressure::{BackpressurePolicy, Buffer};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Keeps everything. Memory is the only bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl<T> BackpressurePolicy<T> for Unbounded {
    fn update(&self, buffer: &mut Buffer<T>, incoming: Payload<T>) -> Vec<Payload<T>> {
        buffer.push_back(incoming);
        Vec::new()
    }
}

impl Display for Unbounded {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BUFFER")
    }
}

/// Admits every payload and evicts the oldest ones beyond `capacity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropOldest {
    capacity: usize,
}

impl DropOldest {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl<T> BackpressurePolicy<T> for DropOldest {
    fn update(&self, buffer: &mut Buffer<T>, incoming: Payload<T>) -> Vec<Payload<T>> {
        buffer.push_back(incoming);
        let overflow = buffer.len().saturating_sub(self.capacity);
        buffer.drain(..overflow).collect()
    }
}

impl Display for DropOldest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "OLDEST({})", self.capacity)
    }
}

/// Keeps what is already buffered and rejects newcomers once `capacity` is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropLatest {
    capacity: usize,
}

impl DropLatest {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl<T> BackpressurePolicy<T> for DropLatest {
    fn update(&self, buffer: &mut Buffer<T>, incoming: Payload<T>) -> Vec<Payload<T>> {
        if buffer.len() >= self.capacity {
            return vec![incoming];
        }
        buffer.push_back(incoming);
        Vec::new()
    }
}

impl Display for DropLatest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LATEST({})", self.capacity)
    }
}
