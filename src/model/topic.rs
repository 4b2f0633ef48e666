use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::path;

/// `/brokers/topics/<topic>`. Partition keys are decimal strings on the
/// wire; parsed into `i32` here so callers never juggle string partition
/// ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopicInfo {
    pub partitions: HashMap<String, Vec<i32>>,
}

impl TopicInfo {
    /// Sorted ascending partition ids.
    pub fn sorted_partition_ids(&self) -> crate::error::Result<Vec<i32>> {
        let mut ids = self
            .partitions
            .keys()
            .map(|k| {
                k.parse::<i32>()
                    .map_err(|_| crate::error::Error::Serialization(format!("partition id '{k}' is not an integer")))
            })
            .collect::<crate::error::Result<Vec<i32>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }
}

/// `(topic, partition)`; equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicAndPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicAndPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        TopicAndPartition {
            topic: topic.into(),
            partition,
        }
    }

    /// `/consumers/<group>/offsets/<topic>/<partition>`.
    pub fn offset_path(&self, group: &str) -> String {
        format!("{}/{}", path::consumer_offset_dir(group, &self.topic), self.partition)
    }

    /// `/consumers/<group>/owners/<topic>/<partition>`.
    pub fn owner_path(&self, group: &str) -> String {
        format!("{}/{}", path::consumer_owner_dir(group, &self.topic), self.partition)
    }
}
