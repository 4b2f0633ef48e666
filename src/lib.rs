//! Group Coordination Core.
//!
//! Manages, via a strongly-consistent hierarchical coordination service, the
//! membership of consumers in a named group, the discovery of
//! brokers/topics/partitions, the computation of partition-to-consumer-thread
//! assignments during rebalancing, and the durable recording of consumed
//! offsets and deployed-topics notifications.
//!
//! This crate owns exactly two tightly coupled subsystems:
//!
//! - [`coordinator`] — a retrying, watcher-aware façade over the
//!   coordination service ([`coordinator::Coordinator`]).
//! - [`assign`] — the deterministic assignment algorithms
//!   ([`assign::Assignor`]).
//!
//! Everything else (the fetcher, the consumer runtime loop, the wire
//! protocol itself) is an external collaborator this crate is embedded into.

pub mod assign;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod model;
pub mod path;
pub mod retry;
pub mod watch;

pub use config::ZookeeperConfig;
pub use coordinator::{Coordinator, CreateMode};
pub use error::{Error, Result};
pub use watch::{CoordinatorEvent, Subscription};
