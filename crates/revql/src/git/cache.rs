//! Single-slot repository handle cache owned by one execution unit.

use super::repository;
use crate::context::RepositoryRoot;
use crate::error::{Result, RevqlError};
use git2::Repository;
use tracing::debug;

/// An open repository together with the root it was opened for.
pub struct CachedRepositoryHandle {
    key: RepositoryRoot,
    handle: Repository,
}

/// Keeps the most recently used repository open.
///
/// Rows that arrive in address order usually share a root, so one slot is
/// enough. The cache belongs to exactly one operator instance and is never
/// shared, hence no locking. Dropping it closes the last handle.
#[derive(Default)]
pub struct HandleCache {
    slot: Option<CachedRepositoryHandle>,
    opens: usize,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `root`, opening it if the cached key differs.
    ///
    /// A previous handle for another root is closed before the new one opens.
    pub fn get_or_open(&mut self, root: &RepositoryRoot) -> Result<&Repository> {
        let stale = self
            .slot
            .as_ref()
            .map_or(true, |cached| cached.key != *root);

        if stale {
            self.release();
            let handle = repository::open(root)?;
            self.opens += 1;
            debug!(root = %root, "opened cached repository handle");
            self.slot = Some(CachedRepositoryHandle {
                key: root.clone(),
                handle,
            });
        }

        match &self.slot {
            Some(cached) => Ok(&cached.handle),
            None => Err(RevqlError::repository_not_found(
                &root.to_string(),
                "repository handle was not cached",
            )),
        }
    }

    /// Closes the cached handle, if any.
    pub fn release(&mut self) {
        if let Some(previous) = self.slot.take() {
            debug!(root = %previous.key, "closing cached repository handle");
        }
    }

    /// Root of the currently cached handle.
    pub fn cached_root(&self) -> Option<&RepositoryRoot> {
        self.slot.as_ref().map(|cached| &cached.key)
    }

    /// Number of repositories this cache has opened over its lifetime.
    pub fn open_count(&self) -> usize {
        self.opens
    }
}

impl Drop for HandleCache {
    fn drop(&mut self) {
        self.release();
    }
}
