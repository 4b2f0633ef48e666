//! Crate-wide error type.
//!
//! One variant per distinct failure kind the coordinator surfaces. Callers matching on this
//! enum should rarely need `Error::Coordination`: it is a last-resort
//! passthrough for whatever the underlying coordination-service client
//! surfaces that doesn't map cleanly onto one of the named kinds.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Failed to establish or re-establish a coordination-service session
    /// within the retry budget.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A required node is missing. Most call sites fold this into a
    /// sentinel instead of surfacing it (see `GetOffsetForTopicPartition`,
    /// `ReleasePartitionOwnership`, `PurgeNotificationForGroup`).
    #[error("node not found: {0}")]
    NotFound(String),

    /// An ephemeral create raced another session and lost. Not really a
    /// failure: callers are expected to treat this as "try again later".
    #[error("ownership contention")]
    Contention,

    /// A versioned SET or DELETE saw a version mismatch.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// JSON encode/decode failure, or any other malformed-payload
    /// condition encountered while parsing wire data.
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// Unknown assignment strategy, or an assignor precondition was
    /// violated. Always fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Passthrough for an underlying coordination-service error that
    /// doesn't map onto one of the kinds above.
    #[error("coordination service error: {0}")]
    Coordination(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// True for the error kinds the retry harness (§4.2) should attempt
    /// again; false for the ones it should give up on immediately.
    pub(crate) fn is_retryable(&self) -> bool {
        !matches!(self, Error::Configuration(_) | Error::Contention)
    }
}
