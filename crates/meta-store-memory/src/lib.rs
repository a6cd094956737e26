//! An in-process, in-memory [`MetadataStore`](chunkftp::meta::MetadataStore)
//! implementation for `chunkftp`.
//!
//! Stands in for a real document database the way `unftp-sbe-fs` stands in
//! for a real cloud object store in the reference engine: good enough to
//! run a small deployment against, and the vehicle the core crate's own
//! integration tests are written against. A single `tokio::sync::RwLock`
//! over a `HashMap<(parent, name), Node>` gives the unique-index semantics
//! §4.2 requires: `insert` checks-then-inserts under one write-lock
//! acquisition, so concurrent inserts of the same key can never both
//! succeed.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use chunkftp::vfs::Node;
use std::collections::HashMap;
use tokio::sync::RwLock;

type Key = (String, String);

/// An in-memory [`MetadataStore`](chunkftp::meta::MetadataStore) backed by
/// one `HashMap` guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    docs: RwLock<HashMap<Key, Node>>,
}

impl MemoryMetadataStore {
    /// An empty store.
    pub fn new() -> MemoryMetadataStore {
        MemoryMetadataStore { docs: RwLock::new(HashMap::new()) }
    }

    fn key(parent: &str, name: &str) -> Key {
        (parent.to_string(), name.to_string())
    }
}

#[async_trait]
impl chunkftp::meta::MetadataStore for MemoryMetadataStore {
    async fn find_one(&self, parent: &str, name: &str) -> std::io::Result<Option<Node>> {
        Ok(self.docs.read().await.get(&Self::key(parent, name)).cloned())
    }

    async fn insert(&self, node: Node) -> std::io::Result<bool> {
        let key = Self::key(&node.parent, &node.name);
        let mut guard = self.docs.write().await;
        if guard.contains_key(&key) {
            return Ok(false);
        }
        guard.insert(key, node);
        Ok(true)
    }

    async fn replace(&self, parent: &str, name: &str, node: Node) -> std::io::Result<()> {
        self.docs.write().await.insert(Self::key(parent, name), node);
        Ok(())
    }

    async fn update_identity(&self, old_parent: &str, old_name: &str, node: Node) -> std::io::Result<()> {
        let mut guard = self.docs.write().await;
        guard.remove(&Self::key(old_parent, old_name));
        guard.insert(Self::key(&node.parent, &node.name), node);
        Ok(())
    }

    async fn delete_one(&self, parent: &str, name: &str) -> std::io::Result<()> {
        self.docs.write().await.remove(&Self::key(parent, name));
        Ok(())
    }

    async fn delete_many_under(&self, prefix: &str) -> std::io::Result<()> {
        let nested = format!("{prefix}/");
        self.docs.write().await.retain(|(parent, _), _| !(parent == prefix || parent.starts_with(&nested)));
        Ok(())
    }

    async fn list(&self, parent: &str) -> std::io::Result<Vec<Node>> {
        let guard = self.docs.read().await;
        let mut out: Vec<Node> = guard.values().filter(|n| n.parent == parent && !n.name.ends_with(".partial")).cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_pending(&self) -> std::io::Result<Vec<Node>> {
        use chunkftp::vfs::FileStatus;
        let guard = self.docs.read().await;
        Ok(guard.values().filter(|n| n.status() == FileStatus::Staging && n.local_path.is_some()).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkftp::meta::MetadataStore;

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryMetadataStore::new();
        let doc = Node::new_dir("/", "alice");
        assert!(store.insert(doc).await.unwrap());
        assert!(store.find_one("/", "alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_key() {
        let store = MemoryMetadataStore::new();
        assert!(store.insert(Node::new_dir("/", "alice")).await.unwrap());
        assert!(!store.insert(Node::new_dir("/", "alice")).await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_partial_suffix() {
        let store = MemoryMetadataStore::new();
        store.insert(Node::new_file_for_write("/alice", "a.txt")).await.unwrap();
        store.insert(Node::new_file_for_write("/alice", "b.txt.partial")).await.unwrap();
        let listed = store.list("/alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a.txt");
    }

    #[tokio::test]
    async fn delete_many_under_cascades() {
        let store = MemoryMetadataStore::new();
        store.insert(Node::new_dir("/", "alice")).await.unwrap();
        store.insert(Node::new_file_for_write("/alice", "a.txt")).await.unwrap();
        store.insert(Node::new_dir("/alice", "docs")).await.unwrap();
        store.insert(Node::new_file_for_write("/alice/docs", "b.txt")).await.unwrap();
        store.delete_many_under("/alice").await.unwrap();
        assert!(store.find_one("/alice", "a.txt").await.unwrap().is_none());
        assert!(store.find_one("/alice/docs", "b.txt").await.unwrap().is_none());
    }
}
