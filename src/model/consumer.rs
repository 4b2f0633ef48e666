use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The `pattern` field of a [`ConsumerInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscription {
    WhiteList,
    BlackList,
    Static,
}

/// Persisted as the ephemeral node `/consumers/<group>/ids/<consumerId>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerInfo {
    pub version: i16,
    pub subscription: HashMap<String, i32>,
    pub pattern: Subscription,
    pub timestamp: i64,
}

/// A single logical stream within a consumer instance.
///
/// Total order is lexicographic over `consumer_id` then numeric over
/// `thread_id`; the string form is `"<consumerId>-<threadId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsumerThreadId {
    pub consumer_id: String,
    pub thread_id: i32,
}

impl ConsumerThreadId {
    pub fn new(consumer_id: impl Into<String>, thread_id: i32) -> Self {
        ConsumerThreadId {
            consumer_id: consumer_id.into(),
            thread_id,
        }
    }
}

impl PartialOrd for ConsumerThreadId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConsumerThreadId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.consumer_id
            .cmp(&other.consumer_id)
            .then(self.thread_id.cmp(&other.thread_id))
    }
}

impl fmt::Display for ConsumerThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.consumer_id, self.thread_id)
    }
}

impl FromStr for ConsumerThreadId {
    type Err = Error;

    /// Parses the `"<consumerId>-<threadId>"` form written into ownership
    /// nodes. `consumerId` itself may contain hyphens, so the split
    /// happens at the *last* one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (consumer_id, thread_id) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::Serialization(format!("'{s}' is not a valid ConsumerThreadId")))?;

        let thread_id: i32 = thread_id
            .parse()
            .map_err(|_| Error::Serialization(format!("'{s}' has a non-numeric thread id")))?;

        Ok(ConsumerThreadId::new(consumer_id, thread_id))
    }
}

/// Mapping `topic -> stream-count` for one consumer.
#[derive(Debug, Clone, Default)]
pub struct TopicsToNumStreams {
    pub consumer_id: String,
    pub streams_per_topic: HashMap<String, i32>,
}

impl TopicsToNumStreams {
    pub fn new(consumer_id: impl Into<String>, streams_per_topic: HashMap<String, i32>) -> Self {
        TopicsToNumStreams {
            consumer_id: consumer_id.into(),
            streams_per_topic,
        }
    }

    /// Per topic, the sorted list of this consumer's [`ConsumerThreadId`]s.
    pub fn consumer_thread_ids_per_topic(&self) -> HashMap<String, Vec<ConsumerThreadId>> {
        self.streams_per_topic
            .iter()
            .map(|(topic, &num_streams)| {
                let mut ids: Vec<ConsumerThreadId> = (0..num_streams)
                    .map(|thread_id| ConsumerThreadId::new(self.consumer_id.clone(), thread_id))
                    .collect();
                ids.sort();
                (topic.clone(), ids)
            })
            .collect()
    }
}
