//! In-process metrics counters (component N): registered once at process
//! start and incremented inline at the point of the event. Exporting them
//! (e.g. over an HTTP scrape endpoint) is left to the embedding binary.

use lazy_static::lazy_static;
use prometheus::{opts, register_int_counter, register_int_gauge, IntCounter, IntGauge};

lazy_static! {
    static ref CONNECTIONS_ACCEPTED: IntCounter =
        register_int_counter!(opts!("chunkftp_connections_accepted", "Total number of accepted control connections.")).unwrap();
    static ref CONNECTIONS_REJECTED: IntCounter =
        register_int_counter!(opts!("chunkftp_connections_rejected", "Total number of connections rejected for exceeding the connection cap.")).unwrap();
    static ref LOGIN_SUCCESS: IntCounter = register_int_counter!(opts!("chunkftp_logins_succeeded", "Total number of successful logins.")).unwrap();
    static ref LOGIN_FAILURE: IntCounter = register_int_counter!(opts!("chunkftp_logins_failed", "Total number of failed logins.")).unwrap();
    static ref UPLOADS_COMPLETED: IntCounter = register_int_counter!(opts!("chunkftp_uploads_completed", "Total number of files fully persisted to the blob store.")).unwrap();
    static ref UPLOADS_FAILED: IntCounter = register_int_counter!(opts!("chunkftp_uploads_failed", "Total number of files abandoned after exhausting upload retries.")).unwrap();
    static ref BYTES_UPLOADED: IntCounter = register_int_counter!(opts!("chunkftp_bytes_uploaded", "Total bytes persisted to the blob store.")).unwrap();
    static ref CHUNKS_PUSHED: IntCounter = register_int_counter!(opts!("chunkftp_chunks_pushed", "Total chunks successfully pushed to the blob store.")).unwrap();
    static ref CHUNK_RETRIES: IntCounter = register_int_counter!(opts!("chunkftp_chunk_retries", "Total chunk push retries, rate-limit and transport combined.")).unwrap();
    static ref UPLOAD_QUEUE_DEPTH: IntGauge = register_int_gauge!(opts!("chunkftp_upload_queue_depth", "Current depth of the upload hand-off queue.")).unwrap();
    static ref RECOVERED_FILES: IntCounter = register_int_counter!(opts!("chunkftp_recovered_files", "Total files re-enqueued by restart recovery.")).unwrap();
}

/// Records an accepted control connection.
pub fn inc_connections_accepted() {
    CONNECTIONS_ACCEPTED.inc();
}

/// Records a connection rejected for exceeding the server-wide cap.
pub fn inc_connections_rejected() {
    CONNECTIONS_REJECTED.inc();
}

/// Records a login outcome.
pub fn record_login(success: bool) {
    if success {
        LOGIN_SUCCESS.inc();
    } else {
        LOGIN_FAILURE.inc();
    }
}

/// Records a file fully persisted to the blob store.
pub fn record_upload_completed(bytes: u64) {
    UPLOADS_COMPLETED.inc();
    BYTES_UPLOADED.inc_by(bytes);
}

/// Records a file abandoned after exhausting upload retries.
pub fn inc_uploads_failed() {
    UPLOADS_FAILED.inc();
}

/// Records one chunk successfully pushed to the blob store.
pub fn inc_chunks_pushed() {
    CHUNKS_PUSHED.inc();
}

/// Records one chunk push retry (rate-limit or transport).
pub fn inc_chunk_retries() {
    CHUNK_RETRIES.inc();
}

/// Sets the current upload queue depth gauge.
pub fn set_upload_queue_depth(depth: i64) {
    UPLOAD_QUEUE_DEPTH.set(depth);
}

/// Records a file re-enqueued by restart recovery.
pub fn inc_recovered_files() {
    RECOVERED_FILES.inc();
}
