//! The blob-messaging backend contract (§6) and the explicit multi-client
//! interface that replaces the original `__getattr__`-based proxy (§9).

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What the blob backend handed back for a successfully sent chunk.
#[derive(Debug, Clone)]
pub struct BlobMessage {
    /// Identifier of the target (channel/bucket/bot) the chunk was sent to.
    pub blob_id: String,
    /// Identifier of the message/object within that target.
    pub msg_id: u64,
    /// Size in bytes as acknowledged by the backend.
    pub size: u32,
}

/// A transport-level failure pushing or streaming a chunk.
#[derive(Debug)]
pub enum BlobError {
    /// The backend is rate-limiting the caller; retry after the advised
    /// delay without counting the attempt against `max_retries` (§4.7).
    RateLimited {
        /// Server-advised delay before retrying.
        retry_after: Duration,
    },
    /// Any other transport/backend error; retried with exponential backoff
    /// up to `max_retries`.
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for BlobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlobError::RateLimited { retry_after } => write!(f, "rate limited, retry after {retry_after:?}"),
            BlobError::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for BlobError {}

/// A byte range delivered while streaming a chunk back out.
pub type BlobBytes = Vec<u8>;

/// The external messaging-based blob backend. Exposes exactly the four
/// operations named in the design notes' explicit interface: `send`,
/// `stream`, `get_chat`, `copy`. No dynamic attribute forwarding.
#[async_trait]
pub trait BlobBackend: Send + Sync + Debug {
    /// Sends a chunk's bytes to `target`, returning its blob identifiers.
    async fn send(&self, target: &str, filename: &str, bytes: &[u8]) -> Result<BlobMessage, BlobError>;

    /// Streams the bytes of `blob_id` starting at `offset`.
    async fn stream(&self, blob_id: &str, offset: u64) -> Result<BlobBytes, BlobError>;

    /// Resolves a human-facing identifier for `target`, used only for
    /// logging/diagnostics.
    async fn get_chat(&self, target: &str) -> Result<String, BlobError>;

    /// Best-effort copy of `blob_id` to `backup_target`. Failures here are
    /// swallowed by the caller (§4.7 step 5) — this method still surfaces
    /// them so the caller can log before swallowing.
    async fn copy(&self, blob_id: &str, backup_target: &str) -> Result<(), BlobError>;
}

/// Wraps a non-empty pool of inner [`BlobBackend`] clients behind a single
/// handle: `send`/`copy` round-robin across the pool under an atomic
/// cursor, `stream`/`get_chat` always go to the designated primary
/// (index 0) for reads, matching the explicit interface the design notes
/// call for in place of attribute-forwarding to "the first client".
#[derive(Debug)]
pub struct RoundRobinBlobBackend<B> {
    clients: Vec<B>,
    cursor: AtomicUsize,
}

impl<B: BlobBackend> RoundRobinBlobBackend<B> {
    /// Builds a round-robin backend from a non-empty list of clients.
    ///
    /// # Panics
    /// Panics if `clients` is empty — a backend with no clients cannot
    /// send or stream anything, and constructing one is always a caller
    /// bug rather than a runtime condition to recover from.
    pub fn new(clients: Vec<B>) -> Self {
        assert!(!clients.is_empty(), "RoundRobinBlobBackend requires at least one client");
        RoundRobinBlobBackend { clients, cursor: AtomicUsize::new(0) }
    }

    fn next_client(&self) -> &B {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[idx]
    }

    fn primary(&self) -> &B {
        &self.clients[0]
    }
}

#[async_trait]
impl<B: BlobBackend> BlobBackend for RoundRobinBlobBackend<B> {
    async fn send(&self, target: &str, filename: &str, bytes: &[u8]) -> Result<BlobMessage, BlobError> {
        self.next_client().send(target, filename, bytes).await
    }

    async fn stream(&self, blob_id: &str, offset: u64) -> Result<BlobBytes, BlobError> {
        self.primary().stream(blob_id, offset).await
    }

    async fn get_chat(&self, target: &str) -> Result<String, BlobError> {
        self.primary().get_chat(target).await
    }

    async fn copy(&self, blob_id: &str, backup_target: &str) -> Result<(), BlobError> {
        self.next_client().copy(blob_id, backup_target).await
    }
}
