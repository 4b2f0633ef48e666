//! Watch Multiplexer: merges the four per-group child watches
//! into a single durable [`CoordinatorEvent`] stream, re-arming after every
//! fire and after session disconnects.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::coordinator::upsert;
use crate::coordinator::{Coordinator, CreateMode, WatchNotice};
use crate::error::Result;
use crate::path;

/// Spurious-wake idle. Hard-coded today; a candidate for a future config
/// knob.
const IDLE_SLEEP: Duration = Duration::from_secs(2);

const EVENT_CHANNEL_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorEvent {
    Regular,
    NewTopicDeployed,
}

/// A live subscription. Drop or call [`Subscription::unsubscribe`] to tear
/// it down; either way the background task exits on its next loop
/// iteration.
pub struct Subscription {
    events: mpsc::Receiver<CoordinatorEvent>,
    unsubscribe_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Receive the next [`CoordinatorEvent`]. Returns `None` once the
    /// subscription has torn down (unsubscribed, or a fatal re-arm error).
    pub async fn recv(&mut self) -> Option<CoordinatorEvent> {
        self.events.recv().await
    }

    /// Cooperative cancellation: signal the background task to
    /// tear down its fan-in and wait for it to exit.
    pub async fn unsubscribe(mut self) {
        if let Some(tx) = self.unsubscribe_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

enum Source {
    Ids,
    Changes,
    Topics,
    Brokers,
}

/// Upserts the four per-group directories so that the first `ChildrenW`
/// on a fresh group succeeds.
async fn ensure_group_paths_exist(coordinator: &dyn Coordinator, group: &str) -> Result<()> {
    for dir in [
        path::consumer_registry_dir(group),
        path::consumer_changes_dir(group),
        path::consumer_sync_dir(group),
    ] {
        upsert::upsert(coordinator, &dir, b"", CreateMode::Persistent).await?;
    }
    Ok(())
}

/// Subscribes to membership, deployment, and topology changes for `group`.
pub async fn subscribe_for_changes(coordinator: Arc<dyn Coordinator>, group: String) -> Result<Subscription> {
    ensure_group_paths_exist(coordinator.as_ref(), &group).await?;

    let ids_path = path::consumer_registry_dir(&group);
    let changes_path = path::consumer_changes_dir(&group);
    let topics_path = crate::constants::BROKER_TOPICS_PATH.to_string();
    let brokers_path = crate::constants::BROKER_IDS_PATH.to_string();

    let (_children, mut ids_watch) = coordinator.raw_watch_children(&ids_path).await?;
    let (_children, mut changes_watch) = coordinator.raw_watch_children(&changes_path).await?;
    let (_children, mut topics_watch) = coordinator.raw_watch_children(&topics_path).await?;
    let (_children, mut brokers_watch) = coordinator.raw_watch_children(&brokers_path).await?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let (unsubscribe_tx, mut unsubscribe_rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        'outer: loop {
            let fired: (Source, std::result::Result<WatchNotice, oneshot::error::RecvError>) = tokio::select! {
                res = &mut ids_watch => (Source::Ids, res),
                res = &mut changes_watch => (Source::Changes, res),
                res = &mut topics_watch => (Source::Topics, res),
                res = &mut brokers_watch => (Source::Brokers, res),
                _ = &mut unsubscribe_rx => {
                    info!("unsubscribe received for group '{group}': tearing down");
                    break 'outer;
                },
            };

            let (source, notice) = fired;
            let notice = match notice {
                Ok(n) => n,
                Err(_) => {
                    // Spurious/empty wake: the watch sender was dropped
                    // without firing. Idle briefly and continue.
                    trace!("spurious wake on watch for group '{group}'");
                    tokio::time::sleep(IDLE_SLEEP).await;
                    continue 'outer;
                },
            };

            let rearm_path = match source {
                Source::Ids => &ids_path,
                Source::Changes => &changes_path,
                Source::Topics => &topics_path,
                Source::Brokers => &brokers_path,
            };

            if notice.disconnected {
                info!("session disconnect observed on group '{group}': re-arming all watches");
                match rearm_all(coordinator.as_ref(), &ids_path, &changes_path, &topics_path, &brokers_path).await {
                    Ok((i, c, t, b)) => {
                        ids_watch = i;
                        changes_watch = c;
                        topics_watch = t;
                        brokers_watch = b;
                    },
                    Err(e) => {
                        error!("failed to re-arm watches for group '{group}' after disconnect: {e}");
                        break 'outer;
                    },
                }
                continue 'outer;
            }

            let event = if notice.path == changes_path {
                CoordinatorEvent::NewTopicDeployed
            } else {
                CoordinatorEvent::Regular
            };

            if events_tx.send(event).await.is_err() {
                info!("subscriber for group '{group}' dropped: tearing down");
                break 'outer;
            }

            // Re-arm exactly the watch that fired.
            match coordinator.raw_watch_children(rearm_path).await {
                Ok((_children, rx)) => match source {
                    Source::Ids => ids_watch = rx,
                    Source::Changes => changes_watch = rx,
                    Source::Topics => topics_watch = rx,
                    Source::Brokers => brokers_watch = rx,
                },
                Err(e) => {
                    error!("failed to re-arm watch '{rearm_path}' for group '{group}': {e}");
                    break 'outer;
                },
            }
        }
    });

    Ok(Subscription {
        events: events_rx,
        unsubscribe_tx: Some(unsubscribe_tx),
        join: Some(join),
    })
}

#[allow(clippy::type_complexity)]
async fn rearm_all(
    coordinator: &dyn Coordinator,
    ids_path: &str,
    changes_path: &str,
    topics_path: &str,
    brokers_path: &str,
) -> Result<(
    oneshot::Receiver<WatchNotice>,
    oneshot::Receiver<WatchNotice>,
    oneshot::Receiver<WatchNotice>,
    oneshot::Receiver<WatchNotice>,
)> {
    let (_c, ids_watch) = coordinator.raw_watch_children(ids_path).await?;
    let (_c, changes_watch) = coordinator.raw_watch_children(changes_path).await?;
    let (_c, topics_watch) = coordinator.raw_watch_children(topics_path).await?;
    let (_c, brokers_watch) = coordinator.raw_watch_children(brokers_path).await?;
    Ok((ids_watch, changes_watch, topics_watch, brokers_watch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZookeeperConfig;
    use crate::coordinator::mock::MockCoordinator;

    #[tokio::test]
    async fn membership_change_emits_regular_event() {
        let coordinator: Arc<dyn Coordinator> = Arc::new(MockCoordinator::new(ZookeeperConfig::default()));
        let mut sub = subscribe_for_changes(coordinator.clone(), "g".to_string()).await.unwrap();

        coordinator
            .register_consumer("c0", "g", Default::default(), crate::model::Subscription::Static)
            .await
            .unwrap();

        let event = sub.recv().await.expect("expected an event");
        assert_eq!(event, CoordinatorEvent::Regular);

        sub.unsubscribe().await;
    }

    #[tokio::test]
    async fn new_topic_deployment_emits_new_topic_deployed() {
        let coordinator: Arc<dyn Coordinator> = Arc::new(MockCoordinator::new(ZookeeperConfig::default()));
        let mut sub = subscribe_for_changes(coordinator.clone(), "g".to_string()).await.unwrap();

        let mut payload = serde_json::Map::new();
        payload.insert("topics".to_string(), serde_json::json!(["new-topic"]));
        coordinator
            .deploy_topics("g", &crate::model::DeployedTopics::new(payload))
            .await
            .unwrap();

        let event = sub.recv().await.expect("expected an event");
        assert_eq!(event, CoordinatorEvent::NewTopicDeployed);

        sub.unsubscribe().await;
    }

    #[tokio::test]
    async fn unsubscribe_tears_down_cleanly() {
        let coordinator: Arc<dyn Coordinator> = Arc::new(MockCoordinator::new(ZookeeperConfig::default()));
        let sub = subscribe_for_changes(coordinator, "g".to_string()).await.unwrap();
        sub.unsubscribe().await;
    }
}
