//! The defaults behind the [`Server`](crate::Server) builder's knobs (§4.15, §6).

use std::ops::RangeInclusive;

/// `220` greeting sent on connect.
pub(crate) const DEFAULT_GREETING: &str = "Welcome to chunkftp";
/// Inclusive passive-mode port range.
pub(crate) const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;
/// Bytes per chunk: 64 MiB.
pub(crate) const DEFAULT_CHUNK_SIZE: u64 = 64 * 1024 * 1024;
/// Maximum retries per chunk before a file is abandoned to the next restart recovery pass.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 5;
/// Upload worker pool size.
pub(crate) const DEFAULT_WORKER_COUNT: usize = 4;
/// Server-wide concurrent connection cap (§6).
pub(crate) const DEFAULT_CONNECTION_CAP: usize = 256;
/// Per-user connection quota (§6).
pub(crate) const DEFAULT_USER_QUOTA: u32 = 100;
/// Upload hand-off queue capacity.
pub(crate) const DEFAULT_UPLOAD_QUEUE_CAPACITY: usize = 256;
