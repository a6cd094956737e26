//! An in-process, in-memory [`BlobBackend`](chunkftp::upload::BlobBackend)
//! for `chunkftp`.
//!
//! Stands in for a real blob-messaging backend (an object store, a
//! messaging platform used as a blob sink) the way `unftp-sbe-fs` stands in
//! for a real cloud storage back-end: good enough for tests and small
//! deployments, and the vehicle the core crate's own upload-pipeline tests
//! run against.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use chunkftp::upload::{BlobBackend, BlobError, BlobMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// An in-memory [`BlobBackend`]: every chunk sent is kept in a `HashMap`
/// keyed by a monotonically increasing message id, addressable later by
/// `stream`.
#[derive(Debug, Default)]
pub struct MemoryBlobBackend {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    next_id: AtomicU64,
}

impl MemoryBlobBackend {
    /// An empty backend.
    pub fn new() -> MemoryBlobBackend {
        MemoryBlobBackend { blobs: RwLock::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    /// Total bytes currently held, for test assertions.
    pub async fn total_bytes(&self) -> usize {
        self.blobs.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn send(&self, target: &str, filename: &str, bytes: &[u8]) -> Result<BlobMessage, BlobError> {
        let msg_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let blob_id = format!("{target}/{filename}");
        self.blobs.write().await.insert(blob_id.clone(), bytes.to_vec());
        Ok(BlobMessage { blob_id, msg_id, size: bytes.len() as u32 })
    }

    async fn stream(&self, blob_id: &str, offset: u64) -> Result<Vec<u8>, BlobError> {
        let guard = self.blobs.read().await;
        let Some(bytes) = guard.get(blob_id) else {
            return Err(BlobError::Transport(format!("no such blob: {blob_id}").into()));
        };
        let offset = offset as usize;
        if offset >= bytes.len() {
            return Ok(Vec::new());
        }
        Ok(bytes[offset..].to_vec())
    }

    async fn get_chat(&self, target: &str) -> Result<String, BlobError> {
        Ok(format!("memory:{target}"))
    }

    async fn copy(&self, blob_id: &str, backup_target: &str) -> Result<(), BlobError> {
        let bytes = {
            let guard = self.blobs.read().await;
            guard.get(blob_id).cloned()
        };
        let Some(bytes) = bytes else {
            return Err(BlobError::Transport(format!("no such blob: {blob_id}").into()));
        };
        self.blobs.write().await.insert(format!("{backup_target}/{blob_id}"), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_then_stream_round_trips() {
        let backend = MemoryBlobBackend::new();
        let msg = backend.send("t1", "c.part_000", b"hello world").await.unwrap();
        let bytes = backend.stream(&msg.blob_id, 0).await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn stream_honors_offset() {
        let backend = MemoryBlobBackend::new();
        let msg = backend.send("t1", "c.part_000", b"hello world").await.unwrap();
        let bytes = backend.stream(&msg.blob_id, 6).await.unwrap();
        assert_eq!(bytes, b"world");
    }

    #[tokio::test]
    async fn copy_is_addressable_under_backup_target() {
        let backend = MemoryBlobBackend::new();
        let msg = backend.send("t1", "c.part_000", b"data").await.unwrap();
        backend.copy(&msg.blob_id, "backup").await.unwrap();
        let bytes = backend.stream(&format!("backup/{}", msg.blob_id), 0).await.unwrap();
        assert_eq!(bytes, b"data");
    }
}
