//! Stable tracing vocabulary.
//!
//! Library code emits `tracing` events tagged with `event = events::*` and a
//! `component` field, and never installs a global subscriber itself. Binaries and test
//! harnesses are responsible for one-time `tracing_subscriber` initialization.

pub mod events;
