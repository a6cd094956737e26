//! The upload pipeline (component F): a durable hand-off queue from the
//! VFS to a pool of background workers that chunk staged files, push them
//! to the blob backend, and atomically swap the file's metadata
//! representation from staging to completed.

pub mod blob;
pub mod queue;
pub mod worker;

pub use blob::{BlobBackend, BlobError, BlobMessage, RoundRobinBlobBackend};
pub use queue::{UploadReceiver, UploadSender, UploadTask};
pub use worker::WorkerConfig;
