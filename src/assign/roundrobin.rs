use std::collections::HashMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::Assignor;
use crate::error::{Error, Result};
use crate::model::{AssignmentContext, ConsumerThreadId, TopicAndPartition};

/// The `"roundrobin"` strategy.
///
/// Requires every topic's subscriber list to be identical: all consumers
/// must subscribe to identical topics with identical stream counts. The
/// shuffle that spreads partitions across threads must be a pure function
/// of the context so that every peer derives the same permutation
/// independently; this is resolved via a `crc32fast` hash of the canonical
/// sorted partition sequence and thread list.
pub struct RoundRobinAssignor;

impl Assignor for RoundRobinAssignor {
    fn assign(&self, ctx: &AssignmentContext) -> Result<HashMap<TopicAndPartition, ConsumerThreadId>> {
        let canonical_threads = canonical_thread_list(ctx)?;

        let mut sequence: Vec<TopicAndPartition> = ctx
            .partitions_for_topic
            .iter()
            .flat_map(|(topic, partitions)| {
                partitions.iter().map(move |&p| TopicAndPartition::new(topic.clone(), p))
            })
            .collect();
        sequence.sort();

        let seed = deterministic_seed(&sequence, &canonical_threads);
        let mut rng = StdRng::seed_from_u64(seed);
        sequence.shuffle(&mut rng);

        let mut result = HashMap::new();
        let mut cycle = canonical_threads.iter().cycle();

        for tp in sequence {
            let thread = cycle.next().expect("canonical_threads is non-empty");
            if thread.consumer_id == ctx.consumer_id {
                result.insert(tp, thread.clone());
            }
        }

        Ok(result)
    }
}

/// Validates the precondition and returns the single shared thread list.
/// Each entry of `consumers_for_topic` already arrives sorted; this
/// additionally checks every entry agrees with the others.
fn canonical_thread_list(ctx: &AssignmentContext) -> Result<Vec<ConsumerThreadId>> {
    let mut entries = ctx.consumers_for_topic.iter();

    let Some((first_topic, first_list)) = entries.next() else {
        return Err(Error::Configuration(
            "roundrobin requires at least one subscribed topic".to_string(),
        ));
    };

    for (topic, list) in entries {
        if list != first_list {
            return Err(Error::Configuration(format!(
                "roundrobin precondition violated: topic '{topic}' has a different subscriber list than '{first_topic}'"
            )));
        }
    }

    Ok(first_list.clone())
}

fn deterministic_seed(sequence: &[TopicAndPartition], threads: &[ConsumerThreadId]) -> u64 {
    let mut hasher = crc32fast::Hasher::new();
    for tp in sequence {
        hasher.update(tp.topic.as_bytes());
        hasher.update(&tp.partition.to_be_bytes());
    }
    for t in threads {
        hasher.update(t.to_string().as_bytes());
    }
    u64::from(hasher.finalize())
}
