//! Process-wide path constants for the coordination service tree.
//!
//! These three paths are owned by the broker side of the ecosystem; this
//! crate only ever reads beneath them.

/// Root under which brokers publish their own liveness nodes.
pub const BROKER_IDS_PATH: &str = "/brokers/ids";

/// Root under which brokers publish topic/partition metadata.
pub const BROKER_TOPICS_PATH: &str = "/brokers/topics";

/// Root under which all consumer-group state lives.
pub const CONSUMERS_PATH: &str = "/consumers";
