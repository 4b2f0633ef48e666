use serde::{Deserialize, Serialize};

/// Published by brokers under `/brokers/ids/<id>`; read-only for this core.
/// Apart from `id` (injected from the path by `GetAllBrokers`), the
/// payload is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerInfo {
    #[serde(default)]
    pub id: i32,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    /// Anything else the broker publishes that this core has no opinion
    /// about. Unknown fields are ignored on read.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
