use serde::{Deserialize, Serialize};

/// Notification payload stored under `/consumers/<group>/changes/<notificationId>`.
/// Opaque to this core beyond JSON round-trip: callers attach whatever
/// shape their deployment tooling produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedTopics {
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl DeployedTopics {
    pub fn new(payload: serde_json::Map<String, serde_json::Value>) -> Self {
        DeployedTopics { payload }
    }
}
