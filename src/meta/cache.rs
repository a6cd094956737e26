//! The process-wide VFS cache (component C): a single map guarded by one
//! mutex held only across in-memory mutations, never across I/O.
//!
//! Grounded in `failed_logins.rs`'s `tokio::sync::Mutex<HashMap<..>>`
//! pattern and in `MongoDBPathIO._memory_cache` / `_cache_lock`: reads
//! consult the cache first and populate it on a store miss; writes update
//! the cache and the store, in that order, under the same lock discipline.

use crate::vfs::node::Node;
use std::collections::HashMap;
use tokio::sync::Mutex;

type Key = (String, String);

/// A process-wide `(parent, name) -> Node` cache. Never evicted by size;
/// invalidated only by explicit mutation (§4.3).
#[derive(Debug, Default)]
pub struct Cache {
    inner: Mutex<HashMap<Key, Node>>,
}

impl Cache {
    /// An empty cache.
    pub fn new() -> Cache {
        Cache { inner: Mutex::new(HashMap::new()) }
    }

    /// Returns a clone of the cached node at `(parent, name)`, if present.
    ///
    /// Also tries the legacy fallback: a `parent` with its leading `/`
    /// stripped, matching a pre-existing encoding some documents in the
    /// store may still carry (§4.3).
    pub async fn get(&self, parent: &str, name: &str) -> Option<Node> {
        let guard = self.inner.lock().await;
        if let Some(node) = guard.get(&(parent.to_string(), name.to_string())) {
            return Some(node.clone());
        }
        if let Some(stripped) = parent.strip_prefix('/') {
            if !stripped.is_empty() {
                if let Some(node) = guard.get(&(stripped.to_string(), name.to_string())) {
                    return Some(node.clone());
                }
            }
        }
        None
    }

    /// Inserts or overwrites the cache entry for `(parent, name)`.
    pub async fn put(&self, parent: &str, name: &str, node: Node) {
        let mut guard = self.inner.lock().await;
        guard.insert((parent.to_string(), name.to_string()), node);
    }

    /// Drops the cache entry for `(parent, name)`, if any.
    pub async fn remove(&self, parent: &str, name: &str) {
        let mut guard = self.inner.lock().await;
        guard.remove(&(parent.to_string(), name.to_string()));
    }

    /// Atomically moves the cache entry from `(old_parent, old_name)` to
    /// `(new_parent, new_name)`, used by `rename`. The lock is held across
    /// both the removal and the insertion, never across any I/O performed
    /// before or after this call.
    pub async fn rename(&self, old_parent: &str, old_name: &str, new_parent: &str, new_name: &str, node: Node) {
        let mut guard = self.inner.lock().await;
        guard.remove(&(old_parent.to_string(), old_name.to_string()));
        guard.insert((new_parent.to_string(), new_name.to_string()), node);
    }

    /// Drops every cache entry whose `parent` equals `prefix` or is nested
    /// under it, used by `rmdir`'s cascade delete. The directory's own
    /// entry must be removed separately by the caller.
    pub async fn remove_under(&self, prefix: &str) {
        let mut guard = self.inner.lock().await;
        guard.retain(|(parent, _), _| !(parent == prefix || parent.starts_with(&format!("{prefix}/"))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::node::Node;

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = Cache::new();
        assert!(cache.get("/alice", "a.txt").await.is_none());
        cache.put("/alice", "a.txt", Node::new_file_for_write("/alice", "a.txt")).await;
        assert!(cache.get("/alice", "a.txt").await.is_some());
    }

    #[tokio::test]
    async fn legacy_fallback_strips_leading_slash() {
        let cache = Cache::new();
        cache.put("alice", "a.txt", Node::new_file_for_write("alice", "a.txt")).await;
        assert!(cache.get("/alice", "a.txt").await.is_some());
    }

    #[tokio::test]
    async fn rename_moves_entry() {
        let cache = Cache::new();
        let node = Node::new_file_for_write("/alice", "a.txt.partial");
        cache.put("/alice", "a.txt.partial", node.clone()).await;
        cache.rename("/alice", "a.txt.partial", "/alice", "a.txt", node).await;
        assert!(cache.get("/alice", "a.txt.partial").await.is_none());
        assert!(cache.get("/alice", "a.txt").await.is_some());
    }
}
