use std::collections::HashMap;

use super::{ConsumerThreadId, TopicsToNumStreams};

/// The sole input to an assignor: a snapshot of membership, subscriptions,
/// and topology, already fetched and sorted.
#[derive(Debug, Clone)]
pub struct AssignmentContext {
    pub consumer_id: String,
    pub group: String,

    /// This consumer's own [`ConsumerThreadId`]s, grouped by topic.
    pub my_topic_thread_ids: HashMap<String, Vec<ConsumerThreadId>>,

    pub my_topic_to_num_streams: TopicsToNumStreams,

    /// `partitionsForTopic[t]`, sorted ascending by partition id.
    pub partitions_for_topic: HashMap<String, Vec<i32>>,

    /// `consumersForTopic[t]`, sorted by [`ConsumerThreadId`] ordering.
    pub consumers_for_topic: HashMap<String, Vec<ConsumerThreadId>>,

    /// All consumer ids currently registered in the group.
    pub consumers: Vec<String>,
}

impl AssignmentContext {
    /// Topics this consumer is subscribed to, derived from
    /// `my_topic_thread_ids`.
    pub fn my_topics(&self) -> impl Iterator<Item = &String> {
        self.my_topic_thread_ids.keys()
    }
}
