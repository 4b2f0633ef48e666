//! Path Upserter: create-or-update a node, auto-creating
//! missing ancestors. The only writer of non-ephemeral group structure.

use log::debug;

use super::{Coordinator, CreateMode};
use crate::error::{Error, Result};

/// `upsert(path, data)`.
///
/// Attempts a create; if the node exists and `data` is nonempty, falls back
/// to a versioned `SET`; if `data` is empty and the node exists, that's a
/// no-op success. If the parent is missing, recursively upserts it with
/// empty data (persistent mode) and retries the create once.
pub async fn upsert<C: Coordinator + ?Sized>(coord: &C, path: &str, data: &[u8], mode: CreateMode) -> Result<()> {
    match coord.raw_create(path, data, mode).await {
        Ok(()) => Ok(()),
        Err(Error::Contention) => {
            if data.is_empty() {
                return Ok(());
            }
            let (_existing, version) = coord.raw_get(path).await?;
            coord.raw_set(path, data, version).await
        },
        Err(Error::NotFound(_)) => {
            upsert_ancestors(coord, path).await?;
            match coord.raw_create(path, data, mode).await {
                Ok(()) => Ok(()),
                Err(Error::Contention) if data.is_empty() => Ok(()),
                Err(Error::Contention) => {
                    let (_existing, version) = coord.raw_get(path).await?;
                    coord.raw_set(path, data, version).await
                },
                Err(e) => Err(e),
            }
        },
        Err(e) => Err(e),
    }
}

/// Ensures `parent(path)` exists, creating every missing ancestor along the
/// way with empty data in persistent mode.
pub(crate) async fn upsert_ancestors<C: Coordinator + ?Sized>(coord: &C, path: &str) -> Result<()> {
    let Some(parent) = parent_of(path) else {
        return Ok(());
    };
    if parent.is_empty() || parent == "/" {
        return Ok(());
    }

    match coord.raw_create(&parent, b"", CreateMode::Persistent).await {
        Ok(()) | Err(Error::Contention) => Ok(()),
        Err(Error::NotFound(_)) => {
            debug!("ancestor '{parent}' missing a parent of its own: recursing");
            Box::pin(upsert_ancestors(coord, &parent)).await?;
            match coord.raw_create(&parent, b"", CreateMode::Persistent).await {
                Ok(()) | Err(Error::Contention) => Ok(()),
                Err(e) => Err(e),
            }
        },
        Err(e) => Err(e),
    }
}

fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    trimmed.rfind('/').map(|idx| {
        if idx == 0 {
            "/".to_string()
        } else {
            trimmed[..idx].to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_nested_path() {
        assert_eq!(parent_of("/consumers/g/ids/c0"), Some("/consumers/g/ids".to_string()));
        assert_eq!(parent_of("/consumers"), Some("/".to_string()));
    }
}
