//! Retry Harness.
//!
//! Every externally-visible coordinator operation except `CommitOffset` and
//! the watch multiplexer's rewatch path is wrapped in this. Expressed as a
//! higher-order wrapper: the public method is the wrapped form, the
//! `try_*` method is the single attempt.

use std::future::Future;

use log::warn;
use tokio::time::sleep;

use crate::config::ZookeeperConfig;
use crate::error::{Error, Result};

/// Try `op` up to `cfg.max_request_retries + 1` times, sleeping
/// `cfg.request_backoff` between attempts. Returns on the first success, or
/// the last error once the budget is exhausted. Configuration errors are
/// never retried — a bad strategy name or precondition violation won't fix
/// itself on a second attempt.
pub async fn retry<T, F, Fut>(cfg: &ZookeeperConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = cfg.max_request_retries + 1;
    let mut last_err: Option<Error> = None;

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(
                    "attempt {}/{} failed: {e}",
                    attempt + 1,
                    attempts,
                );
                last_err = Some(e);
                if attempt + 1 < attempts {
                    sleep(cfg.request_backoff).await;
                }
            },
        }
    }

    Err(last_err.expect("attempts is always >= 1"))
}
