use std::collections::HashMap;

use log::debug;

use super::Assignor;
use crate::error::{Error, Result};
use crate::model::{AssignmentContext, ConsumerThreadId, TopicAndPartition};

/// The `"range"` strategy.
pub struct RangeAssignor;

impl Assignor for RangeAssignor {
    fn assign(&self, ctx: &AssignmentContext) -> Result<HashMap<TopicAndPartition, ConsumerThreadId>> {
        let mut result = HashMap::new();

        for (topic, my_thread_ids) in &ctx.my_topic_thread_ids {
            let partitions = ctx
                .partitions_for_topic
                .get(topic)
                .cloned()
                .unwrap_or_default();
            let consumers = ctx
                .consumers_for_topic
                .get(topic)
                .cloned()
                .unwrap_or_default();

            if consumers.is_empty() {
                continue;
            }

            let n_partitions = partitions.len();
            let n_consumers = consumers.len();
            let n_per_consumer = n_partitions / n_consumers;
            let extra = n_partitions % n_consumers;

            for thread_id in my_thread_ids {
                let pos = consumers.iter().position(|c| c == thread_id).ok_or_else(|| {
                    Error::Configuration(format!(
                        "thread '{thread_id}' not found in consumersForTopic['{topic}']"
                    ))
                })?;

                let start = n_per_consumer * pos + pos.min(extra);
                let n = n_per_consumer + usize::from(pos < extra);

                if n == 0 {
                    debug!("range assignment gives thread '{thread_id}' zero partitions of '{topic}'");
                    continue;
                }

                for &partition in &partitions[start..start + n] {
                    result.insert(TopicAndPartition::new(topic.clone(), partition), thread_id.clone());
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TopicsToNumStreams;
    use std::collections::HashMap;

    fn ctx_for(
        consumer_id: &str,
        topic: &str,
        partitions: Vec<i32>,
        consumers: Vec<ConsumerThreadId>,
        my_threads: Vec<ConsumerThreadId>,
    ) -> AssignmentContext {
        let mut partitions_for_topic = HashMap::new();
        partitions_for_topic.insert(topic.to_string(), partitions);

        let mut consumers_for_topic = HashMap::new();
        consumers_for_topic.insert(topic.to_string(), consumers);

        let mut my_topic_thread_ids = HashMap::new();
        my_topic_thread_ids.insert(topic.to_string(), my_threads);

        AssignmentContext {
            consumer_id: consumer_id.to_string(),
            group: "g".to_string(),
            my_topic_thread_ids,
            my_topic_to_num_streams: TopicsToNumStreams::default(),
            partitions_for_topic,
            consumers_for_topic,
            consumers: vec![],
        }
    }

    #[test]
    fn even_split_between_two_consumers() {
        let c0 = ConsumerThreadId::new("c0", 0);
        let c1 = ConsumerThreadId::new("c1", 0);

        let ctx0 = ctx_for("c0", "t", vec![0, 1, 2, 3], vec![c0.clone(), c1.clone()], vec![c0.clone()]);
        let got0 = RangeAssignor.assign(&ctx0).unwrap();
        assert_eq!(got0.get(&TopicAndPartition::new("t", 0)), Some(&c0));
        assert_eq!(got0.get(&TopicAndPartition::new("t", 1)), Some(&c0));
        assert_eq!(got0.len(), 2);

        let ctx1 = ctx_for("c1", "t", vec![0, 1, 2, 3], vec![c0.clone(), c1.clone()], vec![c1.clone()]);
        let got1 = RangeAssignor.assign(&ctx1).unwrap();
        assert_eq!(got1.get(&TopicAndPartition::new("t", 2)), Some(&c1));
        assert_eq!(got1.get(&TopicAndPartition::new("t", 3)), Some(&c1));
        assert_eq!(got1.len(), 2);
    }

    #[test]
    fn uneven_split_first_threads_get_the_extra() {
        let c1_0 = ConsumerThreadId::new("C1", 0);
        let c1_1 = ConsumerThreadId::new("C1", 1);
        let c2_0 = ConsumerThreadId::new("C2", 0);
        let c2_1 = ConsumerThreadId::new("C2", 1);
        let all = vec![c1_0.clone(), c1_1.clone(), c2_0.clone(), c2_1.clone()];

        let ctx = ctx_for("C1", "t", vec![0, 1, 2, 3, 4], all.clone(), vec![c1_0.clone(), c1_1.clone()]);
        let got = RangeAssignor.assign(&ctx).unwrap();
        assert_eq!(got.get(&TopicAndPartition::new("t", 0)), Some(&c1_0));
        assert_eq!(got.get(&TopicAndPartition::new("t", 1)), Some(&c1_0));
        assert_eq!(got.get(&TopicAndPartition::new("t", 2)), Some(&c1_1));
        assert_eq!(got.len(), 3);

        let ctx2 = ctx_for("C2", "t", vec![0, 1, 2, 3, 4], all, vec![c2_0.clone(), c2_1.clone()]);
        let got2 = RangeAssignor.assign(&ctx2).unwrap();
        assert_eq!(got2.get(&TopicAndPartition::new("t", 3)), Some(&c2_0));
        assert_eq!(got2.get(&TopicAndPartition::new("t", 4)), Some(&c2_1));
        assert_eq!(got2.len(), 2);
    }

    // Output only contains threads belonging to the local consumer.
    #[test]
    fn output_only_contains_local_threads() {
        let c0 = ConsumerThreadId::new("c0", 0);
        let c1 = ConsumerThreadId::new("c1", 0);
        let ctx = ctx_for("c0", "t", vec![0, 1, 2, 3], vec![c0.clone(), c1.clone()], vec![c0.clone()]);
        let got = RangeAssignor.assign(&ctx).unwrap();
        assert!(got.values().all(|t| t.consumer_id == "c0"));
    }

    // k*|C| partitions give exactly k partitions per thread, and the union
    // across both consumers covers every partition with no overlap.
    #[test]
    fn union_of_both_consumers_covers_all_partitions_disjointly() {
        let c0 = ConsumerThreadId::new("c0", 0);
        let c1 = ConsumerThreadId::new("c1", 0);
        let both = vec![c0.clone(), c1.clone()];

        let ctx0 = ctx_for("c0", "t", vec![0, 1, 2, 3, 4, 5], both.clone(), vec![c0.clone()]);
        let got0 = RangeAssignor.assign(&ctx0).unwrap();
        let ctx1 = ctx_for("c1", "t", vec![0, 1, 2, 3, 4, 5], both, vec![c1.clone()]);
        let got1 = RangeAssignor.assign(&ctx1).unwrap();

        assert_eq!(got0.len(), 3);
        assert_eq!(got1.len(), 3);
        for key in got0.keys() {
            assert!(!got1.contains_key(key));
        }
    }

    #[test]
    fn local_thread_missing_from_consumers_for_topic_is_fatal() {
        let c0 = ConsumerThreadId::new("c0", 0);
        let stray = ConsumerThreadId::new("stray", 0);
        let ctx = ctx_for("c0", "t", vec![0, 1], vec![c0], vec![stray]);
        let result = RangeAssignor.assign(&ctx);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
