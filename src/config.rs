//! Coordination-service configuration.
//!
//! This crate performs no I/O to populate this struct: no CLI parsing, no
//! environment variables. An embedder builds one of these directly (or
//! deserializes it from whatever config format it already uses — the
//! `Deserialize` impl is here for that reason alone) and hands it to
//! [`crate::coordinator::zk::ZkCoordinator::connect`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ZookeeperConfig {
    pub zookeeper_connect: Vec<String>,

    #[serde(with = "duration_millis")]
    pub zookeeper_timeout: Duration,

    pub max_request_retries: u32,

    #[serde(with = "duration_millis")]
    pub request_backoff: Duration,
}

impl Default for ZookeeperConfig {
    fn default() -> Self {
        ZookeeperConfig {
            zookeeper_connect: vec!["localhost".to_string()],
            zookeeper_timeout: Duration::from_secs(1),
            max_request_retries: 3,
            request_backoff: Duration::from_millis(150),
        }
    }
}

impl ZookeeperConfig {
    /// Comma-joined connect string, the form most ZooKeeper client
    /// constructors expect (`host1:port,host2:port`).
    pub fn connect_string(&self) -> String {
        self.zookeeper_connect.join(",")
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
