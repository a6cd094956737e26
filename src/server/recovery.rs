//! Restart recovery (component K): on startup, re-enqueue staging files an
//! earlier process instance left mid-upload.

use crate::meta::MetadataStore;
use crate::metrics;
use crate::upload::queue::{UploadSender, UploadTask};

/// Queries pending metadata docs and enqueues an [`UploadTask`] for each
/// one that still has real bytes on disk, per §4.11: a `.partial` name is
/// never recovered (it is an incomplete client write, not an interrupted
/// upload), and a doc whose staging file is missing or empty is skipped.
pub(crate) async fn recover<M: MetadataStore>(store: &M, upload_tx: &UploadSender, logger: &slog::Logger) {
    let pending = match store.find_pending().await {
        Ok(nodes) => nodes,
        Err(e) => {
            slog::error!(logger, "restart recovery: failed to list pending uploads"; "error" => %e);
            return;
        }
    };

    let mut recovered = 0u64;
    for node in pending {
        if node.name.ends_with(".partial") {
            continue;
        }
        let Some(local_path) = node.local_path.clone() else { continue };
        let metadata = match tokio::fs::metadata(&local_path).await {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.len() == 0 {
            continue;
        }
        upload_tx
            .enqueue(UploadTask { local_path, filename: node.name.clone(), parent: node.parent.clone(), size: metadata.len() })
            .await;
        recovered += 1;
        metrics::inc_recovered_files();
    }

    if recovered > 0 {
        slog::info!(logger, "restart recovery complete"; "files_recovered" => recovered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::queue;
    use crate::vfs::node::{Node, NodeType};
    use async_trait::async_trait;

    #[derive(Debug, Default)]
    struct FakeStore {
        pending: Vec<Node>,
    }

    #[async_trait]
    impl MetadataStore for FakeStore {
        async fn find_one(&self, _parent: &str, _name: &str) -> std::io::Result<Option<Node>> {
            Ok(None)
        }
        async fn insert(&self, _node: Node) -> std::io::Result<bool> {
            Ok(true)
        }
        async fn replace(&self, _parent: &str, _name: &str, _node: Node) -> std::io::Result<()> {
            Ok(())
        }
        async fn update_identity(&self, _old_parent: &str, _old_name: &str, _node: Node) -> std::io::Result<()> {
            Ok(())
        }
        async fn delete_one(&self, _parent: &str, _name: &str) -> std::io::Result<()> {
            Ok(())
        }
        async fn delete_many_under(&self, _prefix: &str) -> std::io::Result<()> {
            Ok(())
        }
        async fn list(&self, _parent: &str) -> std::io::Result<Vec<Node>> {
            Ok(Vec::new())
        }
        async fn find_pending(&self) -> std::io::Result<Vec<Node>> {
            Ok(self.pending.clone())
        }
    }

    #[tokio::test]
    async fn skips_partial_and_missing_files() {
        let dir = std::env::temp_dir().join(format!("chunkftp-recovery-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let real_file = dir.join("real.bin");
        tokio::fs::write(&real_file, b"hello").await.unwrap();

        let store = FakeStore {
            pending: vec![
                Node { node_type: NodeType::File, name: "upload.partial".to_string(), parent: "/a".to_string(), ctime: 0, mtime: 0, size: 5, local_path: Some(real_file.to_string_lossy().to_string()), parts: vec![] },
                Node { node_type: NodeType::File, name: "missing.bin".to_string(), parent: "/a".to_string(), ctime: 0, mtime: 0, size: 5, local_path: Some("/no/such/file".to_string()), parts: vec![] },
                Node { node_type: NodeType::File, name: "real.bin".to_string(), parent: "/a".to_string(), ctime: 0, mtime: 0, size: 5, local_path: Some(real_file.to_string_lossy().to_string()), parts: vec![] },
            ],
        };
        let (tx, mut rx) = queue::channel(8);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        recover(&store, &tx, &logger).await;
        drop(tx);

        let task = rx.recv().await.expect("one task recovered");
        assert_eq!(task.filename, "real.bin");
        assert!(rx.recv().await.is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
