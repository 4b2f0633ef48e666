//! Coordinator Client: a retrying, watcher-aware façade over the
//! coordination service.
//!
//! [`Coordinator`] splits into a handful of *raw* primitives (create, set,
//! get, delete, get-children, a single-shot child watch) that each backend
//! must supply, and a set of higher-level operations — the public contract
//! — implemented once, generically, on top of those
//! primitives. [`crate::coordinator::zk::ZkCoordinator`] and
//! [`crate::coordinator::mock::MockCoordinator`] differ only in the raw
//! layer.

pub mod mock;
pub mod upsert;
pub mod zk;

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::oneshot;

use crate::config::ZookeeperConfig;
use crate::constants::{BROKER_IDS_PATH, BROKER_TOPICS_PATH};
use crate::error::{Error, Result};
use crate::model::{
    BrokerInfo, ConsumerInfo, ConsumerThreadId, DeployedTopics, Subscription, TopicAndPartition,
    TopicInfo, TopicsToNumStreams,
};
use crate::path;
use crate::retry::retry;

/// Sentinel meaning "no offset stored".
pub const INVALID_OFFSET: i64 = -1;

/// Prefix reserved for this core's own internal bookkeeping consumer,
/// excluded from `GetConsumersPerTopic` when `exclude_internal` is set.
pub const INTERNAL_CONSUMER_PREFIX: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Persistent,
    Ephemeral,
}

/// A coordination-service watch firing, carrying just enough to drive the
/// Watch Multiplexer.
#[derive(Debug, Clone)]
pub struct WatchNotice {
    pub path: String,
    pub disconnected: bool,
}

/// The coordinator contract. See module docs for the raw/high-level split.
#[async_trait]
pub trait Coordinator: Send + Sync {
    fn config(&self) -> &ZookeeperConfig;

    /// Establishes a coordination-service session.
    async fn connect(&self) -> Result<()>;

    async fn raw_create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<()>;

    /// `data` and the version that must match for the write to apply.
    async fn raw_set(&self, path: &str, data: &[u8], version: i32) -> Result<()>;

    /// `data` and the node's current version.
    async fn raw_get(&self, path: &str) -> Result<(Vec<u8>, i32)>;

    async fn raw_delete(&self, path: &str, version: i32) -> Result<()>;

    async fn raw_get_children(&self, path: &str) -> Result<Vec<String>>;

    /// Arms a single-shot watch on `path`'s children, returning the current
    /// children plus a receiver that resolves the next time they change (or
    /// the session disconnects).
    async fn raw_watch_children(&self, path: &str) -> Result<(Vec<String>, oneshot::Receiver<WatchNotice>)>;

    // ---- high-level contract, generic over the raw layer ----

    async fn register_consumer(
        &self,
        consumer_id: &str,
        group: &str,
        subscription: HashMap<String, i32>,
        pattern: Subscription,
    ) -> Result<()> {
        let info = ConsumerInfo {
            version: 1,
            subscription,
            pattern,
            timestamp: now_seconds(),
        };
        let data = serde_json::to_vec(&info)?;
        let target = path::consumer_registration_path(group, consumer_id);

        retry(self.config(), || {
            let data = data.clone();
            let target = target.clone();
            async move { upsert::upsert(self, &target, &data, CreateMode::Ephemeral).await }
        })
        .await
    }

    async fn deregister_consumer(&self, consumer_id: &str, group: &str) -> Result<()> {
        let target = path::consumer_registration_path(group, consumer_id);
        retry(self.config(), || {
            let target = target.clone();
            async move { delete_ignoring_version(self, &target).await }
        })
        .await
    }

    async fn get_consumer_info(&self, consumer_id: &str, group: &str) -> Result<ConsumerInfo> {
        let target = path::consumer_registration_path(group, consumer_id);
        retry(self.config(), || {
            let target = target.clone();
            async move {
                let (data, _version) = self.raw_get(&target).await?;
                Ok(serde_json::from_slice(&data)?)
            }
        })
        .await
    }

    async fn get_consumers_in_group(&self, group: &str) -> Result<Vec<String>> {
        let target = path::consumer_registry_dir(group);
        retry(self.config(), || {
            let target = target.clone();
            async move {
                let mut children = self.raw_get_children(&target).await?;
                children.sort();
                Ok(children)
            }
        })
        .await
    }

    async fn get_consumers_per_topic(
        &self,
        group: &str,
        exclude_internal: bool,
    ) -> Result<HashMap<String, Vec<ConsumerThreadId>>> {
        let consumer_ids = self.get_consumers_in_group(group).await?;
        let mut by_topic: HashMap<String, Vec<ConsumerThreadId>> = HashMap::new();

        for consumer_id in consumer_ids {
            if exclude_internal && consumer_id.starts_with(INTERNAL_CONSUMER_PREFIX) {
                continue;
            }

            let info = self.get_consumer_info(&consumer_id, group).await?;
            let tns = TopicsToNumStreams::new(consumer_id, info.subscription);
            for (topic, ids) in tns.consumer_thread_ids_per_topic() {
                by_topic.entry(topic).or_default().extend(ids);
            }
        }

        for ids in by_topic.values_mut() {
            ids.sort();
        }

        Ok(by_topic)
    }

    async fn get_all_topics(&self) -> Result<Vec<String>> {
        retry(self.config(), || async {
            let mut topics = self.raw_get_children(BROKER_TOPICS_PATH).await?;
            topics.sort();
            Ok(topics)
        })
        .await
    }

    async fn get_partitions_for_topics(&self, topics: &[String]) -> Result<HashMap<String, Vec<i32>>> {
        let mut result = HashMap::with_capacity(topics.len());
        for topic in topics {
            let target = format!("{BROKER_TOPICS_PATH}/{topic}");
            let partitions = retry(self.config(), || {
                let target = target.clone();
                async move {
                    let (data, _version) = self.raw_get(&target).await?;
                    let info: TopicInfo = serde_json::from_slice(&data)?;
                    info.sorted_partition_ids()
                }
            })
            .await?;
            result.insert(topic.clone(), partitions);
        }
        Ok(result)
    }

    async fn get_all_brokers(&self) -> Result<Vec<BrokerInfo>> {
        retry(self.config(), || async {
            let ids = self.raw_get_children(BROKER_IDS_PATH).await?;
            let mut brokers = Vec::with_capacity(ids.len());
            for id in ids {
                let target = format!("{BROKER_IDS_PATH}/{id}");
                let (data, _version) = self.raw_get(&target).await?;
                let mut broker: BrokerInfo = serde_json::from_slice(&data)?;
                broker.id = id.parse().map_err(|_| Error::Serialization(format!("broker id '{id}' is not an integer")))?;
                brokers.push(broker);
            }
            Ok(brokers)
        })
        .await
    }

    async fn get_offset_for_topic_partition(&self, group: &str, tp: &TopicAndPartition) -> Result<i64> {
        let target = tp.offset_path(group);
        retry(self.config(), || {
            let target = target.clone();
            async move {
                match self.raw_get(&target).await {
                    Ok((data, _version)) => {
                        let text = String::from_utf8(data)
                            .map_err(|e| Error::Serialization(e.to_string()))?;
                        text.trim()
                            .parse::<i64>()
                            .map_err(|e| Error::Serialization(e.to_string()))
                    },
                    Err(Error::NotFound(_)) => Ok(INVALID_OFFSET),
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    /// No retry wrapper: its retry policy belongs to the surrounding
    /// consumer config, not this harness.
    async fn commit_offset(&self, group: &str, tp: &TopicAndPartition, offset: i64) -> Result<()> {
        let target = tp.offset_path(group);
        upsert::upsert(self, &target, offset.to_string().as_bytes(), CreateMode::Persistent).await
    }

    async fn notify_consumer_group(&self, group: &str, consumer_id: &str) -> Result<()> {
        let notif_id = format!("{consumer_id}-{}", now_nanos());
        let target = path::consumer_change_path(group, &notif_id);
        retry(self.config(), || {
            let target = target.clone();
            async move { upsert::upsert(self, &target, b"", CreateMode::Persistent).await }
        })
        .await
    }

    async fn purge_notification_for_group(&self, group: &str, notif_id: &str) -> Result<()> {
        let target = path::consumer_change_path(group, notif_id);
        retry(self.config(), || {
            let target = target.clone();
            async move { delete_ignoring_missing(self, &target).await }
        })
        .await
    }

    async fn deploy_topics(&self, group: &str, payload: &DeployedTopics) -> Result<()> {
        let notif_id = now_seconds().to_string();
        let target = path::consumer_change_path(group, &notif_id);
        let data = serde_json::to_vec(payload)?;
        retry(self.config(), || {
            let target = target.clone();
            let data = data.clone();
            async move { upsert::upsert(self, &target, &data, CreateMode::Persistent).await }
        })
        .await
    }

    async fn get_new_deployed_topics(&self, group: &str) -> Result<HashMap<String, DeployedTopics>> {
        let changes_dir = path::consumer_changes_dir(group);
        retry(self.config(), || {
            let changes_dir = changes_dir.clone();
            async move {
                let ids = self.raw_get_children(&changes_dir).await?;
                let mut result = HashMap::with_capacity(ids.len());
                for id in ids {
                    let target = format!("{changes_dir}/{id}");
                    let (data, _version) = self.raw_get(&target).await?;
                    let deployed: DeployedTopics = if data.is_empty() {
                        DeployedTopics::new(serde_json::Map::new())
                    } else {
                        serde_json::from_slice(&data)?
                    };
                    result.insert(id, deployed);
                }
                Ok(result)
            }
        })
        .await
    }

    async fn claim_partition_ownership(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        thread_id: &ConsumerThreadId,
    ) -> Result<bool> {
        let tp = TopicAndPartition::new(topic, partition);
        let target = tp.owner_path(group);
        let data = thread_id.to_string().into_bytes();

        retry(self.config(), || {
            let target = target.clone();
            let data = data.clone();
            async move { try_claim(self, &target, &data).await }
        })
        .await
    }

    async fn release_partition_ownership(&self, group: &str, topic: &str, partition: i32) -> Result<()> {
        let tp = TopicAndPartition::new(topic, partition);
        let target = tp.owner_path(group);
        retry(self.config(), || {
            let target = target.clone();
            async move { delete_ignoring_missing(self, &target).await }
        })
        .await
    }
}

async fn try_claim<C: Coordinator + ?Sized>(coord: &C, target: &str, data: &[u8]) -> Result<bool> {
    match coord.raw_create(target, data, CreateMode::Ephemeral).await {
        Ok(()) => Ok(true),
        Err(Error::Contention) => {
            debug!("claim on '{target}' lost to contention");
            Ok(false)
        },
        Err(Error::NotFound(_)) => {
            // Owner directory doesn't exist yet: create the ancestors, then
            // retry the create exactly once.
            upsert::upsert_ancestors(coord, target).await?;
            match coord.raw_create(target, data, CreateMode::Ephemeral).await {
                Ok(()) => Ok(true),
                Err(Error::Contention) => Ok(false),
                Err(e) => Err(e),
            }
        },
        Err(e) => Err(e),
    }
}

async fn delete_ignoring_missing<C: Coordinator + ?Sized>(coord: &C, target: &str) -> Result<()> {
    match coord.raw_get(target).await {
        Ok((_data, version)) => match coord.raw_delete(target, version).await {
            Ok(()) | Err(Error::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        },
        Err(Error::NotFound(_)) => {
            warn!("'{target}' already absent: treating delete as success");
            Ok(())
        },
        Err(e) => Err(e),
    }
}

async fn delete_ignoring_version<C: Coordinator + ?Sized>(coord: &C, target: &str) -> Result<()> {
    let (_data, version) = coord.raw_get(target).await?;
    coord.raw_delete(target, version).await
}

fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
