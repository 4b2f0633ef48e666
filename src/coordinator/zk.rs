//! The real [`Coordinator`] implementation, wrapping `tokio-zookeeper`.
//!
//! This module is the only place in the crate that speaks the coordination
//! service's wire protocol, and it does so entirely through the
//! `tokio-zookeeper` client; the wire protocol itself is an external
//! collaborator, out of scope here.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::sync::{oneshot, RwLock};
use tokio_zookeeper::{Acl, CreateMode as ZkCreateMode, WatchedEvent, ZooKeeper};

use super::{Coordinator, CreateMode, WatchNotice};
use crate::config::ZookeeperConfig;
use crate::error::{Error, Result};

/// Port assumed for a configured host that doesn't spell one out, matching
/// the coordination service's own default listener port.
const DEFAULT_PORT: u16 = 2181;

/// Appends [`DEFAULT_PORT`] to `host` unless it already carries a `:port`
/// suffix. `host` may itself be a bare hostname (e.g. `localhost`); actual
/// resolution to a [`std::net::SocketAddr`] happens afterwards via DNS.
fn ensure_port(host: &str) -> String {
    if host.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        host.to_string()
    } else {
        format!("{host}:{DEFAULT_PORT}")
    }
}

/// Wraps a live `tokio-zookeeper` session behind the [`Coordinator`]
/// contract. The session handle is shared across every operation of one
/// coordinator instance — the underlying client is assumed thread-safe —
/// guarded by an `RwLock` only so it can be transparently re-established
/// after a disconnect.
pub struct ZkCoordinator {
    config: ZookeeperConfig,
    session: RwLock<Option<Arc<ZooKeeper>>>,
}

impl ZkCoordinator {
    pub fn new(config: ZookeeperConfig) -> Self {
        ZkCoordinator {
            config,
            session: RwLock::new(None),
        }
    }

    async fn session(&self) -> Result<Arc<ZooKeeper>> {
        if let Some(zk) = self.session.read().await.as_ref() {
            return Ok(zk.clone());
        }
        self.connect().await?;
        self.session
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| Error::Connection("session absent after connect".into()))
    }
}

#[async_trait]
impl Coordinator for ZkCoordinator {
    fn config(&self) -> &ZookeeperConfig {
        &self.config
    }

    async fn connect(&self) -> Result<()> {
        // TODO: tokio-zookeeper connects to a single SocketAddr; a real
        // ensemble connect string needs client-side failover across hosts.
        // Using the first host until that's wired up.
        let host = self
            .config
            .zookeeper_connect
            .first()
            .cloned()
            .unwrap_or_else(|| "localhost".to_string());
        let addr = ensure_port(&host);
        info!("connecting to coordination service at {addr}");

        let socket_addr = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| Error::Connection(format!("could not resolve '{addr}': {e}")))?
            .next()
            .ok_or_else(|| Error::Connection(format!("'{addr}' resolved to no addresses")))?;

        let (zk, mut default_watcher) = ZooKeeper::connect(&socket_addr)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        *self.session.write().await = Some(Arc::new(zk));

        // The default watcher stream fires for session-level events
        // (disconnect/reconnect); the Watch Multiplexer re-arms its own
        // per-path watches on top of this signal. We just drain and log it
        // here so the channel doesn't back up before a subscription claims it.
        tokio::spawn(async move {
            while let Some(event) = default_watcher.recv().await {
                debug!("default watcher event: {event:?}");
            }
        });

        Ok(())
    }

    async fn raw_create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<()> {
        let zk = self.session().await?;
        let zk_mode = match mode {
            CreateMode::Persistent => ZkCreateMode::Persistent,
            CreateMode::Ephemeral => ZkCreateMode::Ephemeral,
        };

        match zk.create(path, data.to_vec(), Acl::open_unsafe().clone(), zk_mode).await {
            Ok(Ok(_created_path)) => Ok(()),
            Ok(Err(tokio_zookeeper::error::Create::NodeExists)) => Err(Error::Contention),
            Ok(Err(tokio_zookeeper::error::Create::NoNode)) => Err(Error::NotFound(path.to_string())),
            Ok(Err(e)) => Err(Error::Coordination(format!("create '{path}' failed: {e:?}"))),
            Err(e) => Err(Error::Connection(e.to_string())),
        }
    }

    async fn raw_set(&self, path: &str, data: &[u8], version: i32) -> Result<()> {
        let zk = self.session().await?;
        match zk.set_data(path, Some(version), data.to_vec()).await {
            Ok(Ok(_stat)) => Ok(()),
            Ok(Err(tokio_zookeeper::error::SetData::NoNode)) => Err(Error::NotFound(path.to_string())),
            Ok(Err(tokio_zookeeper::error::SetData::BadVersion)) => Err(Error::Conflict(path.to_string())),
            Ok(Err(e)) => Err(Error::Coordination(format!("set '{path}' failed: {e:?}"))),
            Err(e) => Err(Error::Connection(e.to_string())),
        }
    }

    async fn raw_get(&self, path: &str) -> Result<(Vec<u8>, i32)> {
        let zk = self.session().await?;
        match zk.get_data(path).await {
            Ok(Some((data, stat))) => Ok((data, stat.version)),
            Ok(None) => Err(Error::NotFound(path.to_string())),
            Err(e) => Err(Error::Connection(e.to_string())),
        }
    }

    async fn raw_delete(&self, path: &str, version: i32) -> Result<()> {
        let zk = self.session().await?;
        match zk.delete(path, Some(version)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(tokio_zookeeper::error::Delete::NoNode)) => Err(Error::NotFound(path.to_string())),
            Ok(Err(tokio_zookeeper::error::Delete::BadVersion)) => Err(Error::Conflict(path.to_string())),
            Ok(Err(e)) => Err(Error::Coordination(format!("delete '{path}' failed: {e:?}"))),
            Err(e) => Err(Error::Connection(e.to_string())),
        }
    }

    async fn raw_get_children(&self, path: &str) -> Result<Vec<String>> {
        let zk = self.session().await?;
        match zk.get_children(path).await {
            Ok(Some(children)) => Ok(children),
            Ok(None) => Err(Error::NotFound(path.to_string())),
            Err(e) => Err(Error::Connection(e.to_string())),
        }
    }

    async fn raw_watch_children(&self, path: &str) -> Result<(Vec<String>, oneshot::Receiver<WatchNotice>)> {
        let zk = self.session().await?;
        let (children, zk_watch) = match zk.watch().get_children(path).await {
            Ok(Some(result)) => result,
            Ok(None) => return Err(Error::NotFound(path.to_string())),
            Err(e) => return Err(Error::Connection(e.to_string())),
        };

        let (tx, rx) = oneshot::channel();
        let path_owned = path.to_string();
        tokio::spawn(async move {
            if let Ok(event) = zk_watch.await {
                let notice = watched_event_to_notice(&path_owned, event);
                let _ = tx.send(notice);
            }
        });

        Ok((children, rx))
    }
}

fn watched_event_to_notice(path: &str, event: WatchedEvent) -> WatchNotice {
    let disconnected = matches!(
        event.keeper_state,
        tokio_zookeeper::KeeperState::Disconnected | tokio_zookeeper::KeeperState::Expired
    );
    WatchNotice {
        path: path.to_string(),
        disconnected,
    }
}
