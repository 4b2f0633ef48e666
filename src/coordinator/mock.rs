//! Mock Coordinator: an in-memory node tree implementing [`Coordinator`],
//! for tests that shouldn't need a live coordination service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, RwLock};

use super::{Coordinator, CreateMode, WatchNotice};
use crate::config::ZookeeperConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Node {
    data: Vec<u8>,
    version: i32,
    ephemeral: bool,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: HashMap<String, Node>,
    watchers: HashMap<String, Vec<oneshot::Sender<WatchNotice>>>,
}

/// An in-memory stand-in for a coordination-service session. Every instance
/// has its own independent session (its ephemeral nodes disappear only when
/// explicitly deleted via this handle), but instances sharing an
/// [`Arc<RwLock<Tree>>`] via [`MockCoordinator::fork`] observe each other's
/// writes — the shape needed to exercise claim contention between two
/// racing consumers.
#[derive(Debug, Clone)]
pub struct MockCoordinator {
    config: ZookeeperConfig,
    tree: Arc<RwLock<Tree>>,
}

impl MockCoordinator {
    pub fn new(config: ZookeeperConfig) -> Self {
        MockCoordinator {
            config,
            tree: Arc::new(RwLock::new(Tree::default())),
        }
    }

    /// A second handle sharing the same underlying tree: models a second
    /// consumer instance racing against this one.
    pub fn fork(&self) -> Self {
        MockCoordinator {
            config: self.config.clone(),
            tree: self.tree.clone(),
        }
    }

    fn parent_of(path: &str) -> Option<String> {
        let trimmed = path.trim_end_matches('/');
        trimmed.rfind('/').map(|idx| if idx == 0 { "/".to_string() } else { trimmed[..idx].to_string() })
    }
}

#[async_trait]
impl Coordinator for MockCoordinator {
    fn config(&self) -> &ZookeeperConfig {
        &self.config
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn raw_create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<()> {
        let mut tree = self.tree.write().await;

        if tree.nodes.contains_key(path) {
            return Err(Error::Contention);
        }

        if let Some(parent) = Self::parent_of(path) {
            if parent != "/" && !parent.is_empty() && !tree.nodes.contains_key(&parent) {
                return Err(Error::NotFound(parent));
            }
        }

        tree.nodes.insert(
            path.to_string(),
            Node {
                data: data.to_vec(),
                version: 0,
                ephemeral: mode == CreateMode::Ephemeral,
            },
        );

        notify_parent_watchers(&mut tree, path);
        Ok(())
    }

    async fn raw_set(&self, path: &str, data: &[u8], version: i32) -> Result<()> {
        let mut tree = self.tree.write().await;
        match tree.nodes.get_mut(path) {
            Some(node) if node.version == version => {
                node.data = data.to_vec();
                node.version += 1;
                Ok(())
            },
            Some(_) => Err(Error::Conflict(path.to_string())),
            None => Err(Error::NotFound(path.to_string())),
        }
    }

    async fn raw_get(&self, path: &str) -> Result<(Vec<u8>, i32)> {
        let tree = self.tree.read().await;
        tree.nodes
            .get(path)
            .map(|n| (n.data.clone(), n.version))
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn raw_delete(&self, path: &str, version: i32) -> Result<()> {
        let mut tree = self.tree.write().await;
        match tree.nodes.get(path) {
            Some(node) if node.version == version => {
                tree.nodes.remove(path);
                notify_parent_watchers(&mut tree, path);
                Ok(())
            },
            Some(_) => Err(Error::Conflict(path.to_string())),
            None => Err(Error::NotFound(path.to_string())),
        }
    }

    async fn raw_get_children(&self, path: &str) -> Result<Vec<String>> {
        let tree = self.tree.read().await;
        Ok(children_of(&tree, path))
    }

    async fn raw_watch_children(&self, path: &str) -> Result<(Vec<String>, oneshot::Receiver<WatchNotice>)> {
        let mut tree = self.tree.write().await;
        let children = children_of(&tree, path);
        let (tx, rx) = oneshot::channel();
        tree.watchers.entry(path.to_string()).or_default().push(tx);
        Ok((children, rx))
    }
}

fn children_of(tree: &Tree, path: &str) -> Vec<String> {
    let prefix = if path.ends_with('/') { path.to_string() } else { format!("{path}/") };
    let mut children: Vec<String> = tree
        .nodes
        .keys()
        .filter_map(|k| k.strip_prefix(&prefix))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        .map(|s| s.to_string())
        .collect();
    children.sort();
    children
}

fn notify_parent_watchers(tree: &mut Tree, changed_path: &str) {
    if let Some(parent) = MockCoordinator::parent_of(changed_path) {
        if let Some(senders) = tree.watchers.remove(&parent) {
            for tx in senders {
                let _ = tx.send(WatchNotice {
                    path: parent.clone(),
                    disconnected: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConsumerThreadId;

    #[tokio::test]
    async fn claim_is_exclusive_between_two_sessions() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        let b = a.fork();

        let t1 = ConsumerThreadId::new("c1", 0);
        let t2 = ConsumerThreadId::new("c2", 0);

        let won_a = a.claim_partition_ownership("g", "orders", 0, &t1).await.unwrap();
        let won_b = b.claim_partition_ownership("g", "orders", 0, &t2).await.unwrap();

        assert!(won_a);
        assert!(!won_b);
    }

    #[tokio::test]
    async fn release_then_reclaim_succeeds() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        let t1 = ConsumerThreadId::new("c1", 0);

        assert!(a.claim_partition_ownership("g", "orders", 0, &t1).await.unwrap());
        a.release_partition_ownership("g", "orders", 0).await.unwrap();
        assert!(a.claim_partition_ownership("g", "orders", 0, &t1).await.unwrap());
    }

    #[tokio::test]
    async fn missing_offset_returns_sentinel() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        let tp = crate::model::TopicAndPartition::new("orders", 7);
        let offset = a.get_offset_for_topic_partition("g", &tp).await.unwrap();
        assert_eq!(offset, crate::coordinator::INVALID_OFFSET);
    }

    #[tokio::test]
    async fn commit_then_read_offset_round_trips() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        let tp = crate::model::TopicAndPartition::new("orders", 1);
        a.commit_offset("g", &tp, 42).await.unwrap();
        let offset = a.get_offset_for_topic_partition("g", &tp).await.unwrap();
        assert_eq!(offset, 42);
    }

    #[tokio::test]
    async fn purge_missing_notification_is_success() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        a.purge_notification_for_group("g", "does-not-exist").await.unwrap();
    }

    #[tokio::test]
    async fn deploy_then_read_back_round_trips() {
        let a = MockCoordinator::new(ZookeeperConfig::default());
        let mut payload = serde_json::Map::new();
        payload.insert("topics".to_string(), serde_json::json!(["t1", "t2"]));
        let deployed = crate::model::DeployedTopics::new(payload.clone());

        a.deploy_topics("g", &deployed).await.unwrap();
        let all = a.get_new_deployed_topics("g").await.unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all.values().next().unwrap().payload, payload);
    }
}
