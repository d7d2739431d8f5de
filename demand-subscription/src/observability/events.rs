//! Event names attached to every structured log line as the `event` field.

pub const DEMAND_REQUESTED: &str = "demand_requested";
pub const DEMAND_INVALID: &str = "demand_invalid";
pub const PUBLISH_ADMITTED: &str = "publish_admitted";
pub const PUBLISH_REJECTED_CLOSED: &str = "publish_rejected_closed";
pub const PAYLOAD_DISCARDED: &str = "payload_discarded";
pub const POLICY_SWAPPED: &str = "policy_swapped";

pub const PASS_DISPATCHED: &str = "pass_dispatched";
pub const PASS_BATCH_TAKEN: &str = "pass_batch_taken";
pub const PASS_ITEM_DELIVERED: &str = "pass_item_delivered";
pub const PASS_INTERRUPTED: &str = "pass_interrupted";
pub const PASS_ABORTED: &str = "pass_aborted";
pub const PASS_FINISHED: &str = "pass_finished";
pub const PASS_ABANDONED: &str = "pass_abandoned";
pub const PASS_SUBSCRIBER_PANICKED: &str = "pass_subscriber_panicked";

pub const COMPLETION_SIGNALLED: &str = "completion_signalled";
pub const STREAM_COMPLETED: &str = "stream_completed";
pub const STREAM_FAILED: &str = "stream_failed";
pub const SUBSCRIPTION_CANCELLED: &str = "subscription_cancelled";
pub const PRODUCER_DETACHED: &str = "producer_detached";

pub const CONFIG_LOADED: &str = "config_loaded";
