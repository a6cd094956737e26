//! The upload worker pool (component F): pulls tasks off the hand-off
//! queue, splits staging files into fixed-size chunks, pushes each to the
//! blob backend with retry/backoff, and atomically swaps the file's
//! metadata representation from staging to completed.
//!
//! Grounded in `main.py`'s `upload_worker`: the retry policy (rate-limit
//! sleep-without-counting vs. `2^attempt` exponential backoff up to
//! `max_retries`), the chunk naming scheme, and the final metadata swap
//! are all carried over from there.

use crate::error::Error;
use crate::meta::{Cache, MetadataStore};
use crate::metrics;
use crate::upload::blob::{BlobBackend, BlobError};
use crate::upload::queue::{UploadReceiver, UploadTask};
use crate::vfs::node::{ChunkRef, FileStatus, Node, NodeType};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

/// Configuration the worker loop needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bytes per chunk (default 64 MiB).
    pub chunk_size: u64,
    /// Maximum retries per chunk before abandoning the file (default 5).
    pub max_retries: u32,
    /// Identifier of the primary blob-backend target.
    pub blob_target: String,
    /// Identifier of an optional backup target; chunk copies here are
    /// best-effort and never fail the upload.
    pub backup_target: Option<String>,
}

/// Runs the worker loop until the queue is closed and drained. Spawned
/// once per configured worker (default 4); `logger` should already carry a
/// per-worker identifier.
pub async fn run<M: MetadataStore + 'static, B: BlobBackend + 'static>(
    mut rx: UploadReceiver,
    store: Arc<M>,
    cache: Arc<Cache>,
    backend: Arc<B>,
    config: WorkerConfig,
    logger: slog::Logger,
) {
    while let Some(task) = rx.recv().await {
        if let Err(e) = process_task(&task, &store, &cache, &backend, &config, &logger).await {
            slog::warn!(logger, "upload task failed"; "file" => %task.filename, "error" => %e);
        }
    }
}

async fn process_task<M: MetadataStore, B: BlobBackend>(
    task: &UploadTask,
    store: &Arc<M>,
    cache: &Arc<Cache>,
    backend: &Arc<B>,
    config: &WorkerConfig,
    logger: &slog::Logger,
) -> Result<(), Error> {
    // Defense in depth against I5: a `.partial` task should never have been enqueued.
    if task.filename.ends_with(".partial") {
        slog::warn!(logger, "refusing to upload a .partial file"; "file" => %task.filename);
        return Ok(());
    }

    let metadata = match tokio::fs::metadata(&task.local_path).await {
        Ok(m) => m,
        Err(_) => return Ok(()), // missing: ack and continue
    };
    if metadata.len() == 0 {
        let _ = tokio::fs::remove_file(&task.local_path).await;
        return Ok(());
    }

    let Some(mut node) = store.find_one(&task.parent, &task.filename).await? else {
        return Ok(()); // no metadata doc: ack and continue
    };

    let file_uuid = Uuid::new_v4().simple().to_string();
    let mut parts = Vec::new();
    let mut part_num: u32 = 0;
    let mut file = tokio::fs::File::open(&task.local_path).await?;
    let mut offset: u64 = 0;
    let total = metadata.len();

    while offset < total {
        let this_chunk_size = std::cmp::min(config.chunk_size, total - offset);
        let mut buf = vec![0u8; this_chunk_size as usize];
        file.seek(std::io::SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buf).await?;

        let chunk_name = format!("{file_uuid}.part_{part_num:03}");
        let msg = push_chunk_with_retry(backend, &config.blob_target, &chunk_name, &buf, config.max_retries, logger).await?;

        if let Some(backup) = &config.backup_target {
            if let Err(e) = backend.copy(&msg.blob_id, backup).await {
                slog::warn!(logger, "backup copy failed, continuing"; "chunk" => %chunk_name, "error" => %e);
            }
        }

        parts.push(ChunkRef {
            part_id: part_num,
            blob_id: msg.blob_id,
            blob_msg_id: msg.msg_id,
            size: this_chunk_size as u32,
            chunk_name,
        });
        metrics::inc_chunks_pushed();
        offset += this_chunk_size;
        part_num += 1;
    }

    node.node_type = NodeType::File;
    node.size = total;
    node.mtime = crate::vfs::node::now_secs();
    node.parts = parts;
    node.local_path = None;
    debug_assert_eq!(node.status(), FileStatus::Completed);

    store.replace(&task.parent, &task.filename, node.clone()).await?;
    cache.put(&task.parent, &task.filename, node).await;
    let _ = tokio::fs::remove_file(&task.local_path).await;
    metrics::record_upload_completed(total);
    slog::info!(logger, "upload completed"; "file" => %task.filename, "bytes" => total);
    Ok(())
}

async fn push_chunk_with_retry<B: BlobBackend>(
    backend: &Arc<B>,
    target: &str,
    chunk_name: &str,
    bytes: &[u8],
    max_retries: u32,
    logger: &slog::Logger,
) -> Result<crate::upload::blob::BlobMessage, Error> {
    let mut attempt: u32 = 0;
    loop {
        match backend.send(target, chunk_name, bytes).await {
            Ok(msg) => return Ok(msg),
            Err(BlobError::RateLimited { retry_after }) => {
                metrics::inc_chunk_retries();
                slog::debug!(logger, "rate limited, retrying"; "chunk" => chunk_name, "retry_after" => ?retry_after);
                sleep(retry_after + Duration::from_secs(2)).await;
                // Rate-limit waits are not counted against max_retries.
            }
            Err(BlobError::Transport(e)) => {
                if attempt >= max_retries {
                    metrics::inc_uploads_failed();
                    return Err(Error::new(crate::error::ErrorKind::IoFailure, e));
                }
                metrics::inc_chunk_retries();
                let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
                slog::warn!(logger, "chunk push failed, backing off"; "chunk" => chunk_name, "attempt" => attempt, "error" => %e);
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::blob::BlobMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Default)]
    struct FlakyBackend {
        fail_times: AtomicU32,
    }

    #[async_trait]
    impl BlobBackend for FlakyBackend {
        async fn send(&self, _target: &str, _filename: &str, bytes: &[u8]) -> Result<BlobMessage, BlobError> {
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(BlobError::Transport("boom".into()));
            }
            Ok(BlobMessage { blob_id: "b1".into(), msg_id: 1, size: bytes.len() as u32 })
        }
        async fn stream(&self, _blob_id: &str, _offset: u64) -> Result<crate::upload::blob::BlobBytes, BlobError> {
            Ok(Vec::new())
        }
        async fn get_chat(&self, _target: &str) -> Result<String, BlobError> {
            Ok("chat".into())
        }
        async fn copy(&self, _blob_id: &str, _backup_target: &str) -> Result<(), BlobError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn retries_transport_errors_then_succeeds() {
        let backend = FlakyBackend { fail_times: AtomicU32::new(2) };
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let msg = push_chunk_with_retry(&Arc::new(backend), "t", "c.part_000", b"hello", 5, &logger).await.unwrap();
        assert_eq!(msg.blob_id, "b1");
    }
}
