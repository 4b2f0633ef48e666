//! Assignment Engine: deterministic algorithms that, given an
//! [`AssignmentContext`], compute one local consumer's partition ownership.

mod range;
mod roundrobin;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{AssignmentContext, ConsumerThreadId, TopicAndPartition};

pub use range::RangeAssignor;
pub use roundrobin::RoundRobinAssignor;

/// A pure function from cluster view to partition ownership.
pub trait Assignor {
    /// Entries are restricted to threads whose `consumer_id` matches
    /// `ctx.consumer_id`.
    fn assign(&self, ctx: &AssignmentContext) -> Result<HashMap<TopicAndPartition, ConsumerThreadId>>;
}

/// Looks up an assignor by its strategy name. An unknown name is a
/// fatal configuration error.
pub fn for_strategy(name: &str) -> Result<Box<dyn Assignor>> {
    match name {
        "range" => Ok(Box::new(RangeAssignor)),
        "roundrobin" => Ok(Box::new(RoundRobinAssignor)),
        other => Err(Error::Configuration(format!("unknown assignment strategy '{other}'"))),
    }
}
