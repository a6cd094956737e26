//! The staging file handle (component E): a write-to-disk sink and a
//! chunk-stream source, unifying "bytes on local disk" and "ordered chunk
//! list in the blob store" behind one API.
//!
//! Grounded in `MongoDBMemoryIO`: `write_stream`'s 1 MiB block loop and
//! its write-through-then-enqueue tail, and `iter_by_block`'s
//! local-disk-vs-remote-parts branch with its `local_offset` arithmetic.

use crate::error::{Error, ErrorKind};
use crate::meta::{Cache, MetadataStore};
use crate::upload::blob::BlobBackend;
use crate::upload::queue::{UploadSender, UploadTask};
use crate::vfs::node::{now_secs, Node};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

const WRITE_BLOCK_SIZE: usize = 1024 * 1024;

/// Which direction a [`StagingHandle`] was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `open(path, "rb")`.
    Read,
    /// `open(path, "wb")`.
    Write,
}

/// A handle returned by `Vfs::open`, bound to one node and one
/// session-unique staging filename.
pub struct StagingHandle<M, B> {
    store: Arc<M>,
    cache: Arc<Cache>,
    blob: Arc<B>,
    upload_tx: UploadSender,
    staging_dir: PathBuf,
    node: Node,
    parent: String,
    name: String,
    mode: OpenMode,
    /// `<uuid-hex>_<name>`, unique per open, under the staging directory.
    staging_filename: String,
    offset: u64,
}

impl<M: MetadataStore, B: BlobBackend> StagingHandle<M, B> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<M>,
        cache: Arc<Cache>,
        blob: Arc<B>,
        upload_tx: UploadSender,
        staging_dir: PathBuf,
        node: Node,
        parent: String,
        name: String,
        mode: OpenMode,
    ) -> Self {
        let staging_filename = format!("{}_{}", Uuid::new_v4().simple(), name);
        StagingHandle { store, cache, blob, upload_tx, staging_dir, node, parent, name, mode, staging_filename, offset: 0 }
    }

    /// Sets the start offset for the next `write_stream`/`iter_by_block`
    /// call. Used to implement `REST`.
    pub fn seek(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Streams `source`'s bytes to the staging path (honoring the seek
    /// offset), then writes a staging doc through the cache and
    /// best-effort to the store, and — iff this file's name does not end
    /// in `.partial` and the final size is nonzero — enqueues an upload
    /// task (I5).
    pub async fn write_stream<R>(&mut self, mut source: R) -> Result<u64, Error>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let local_path = self.staging_dir.join(&self.staging_filename);

        let mut file = tokio::fs::OpenOptions::new().create(true).write(true).open(&local_path).await?;
        if self.offset > 0 {
            file.seek(std::io::SeekFrom::Start(self.offset)).await?;
        }

        let mut buf = vec![0u8; WRITE_BLOCK_SIZE];
        loop {
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
        }
        file.flush().await?;

        let final_size = tokio::fs::metadata(&local_path).await?.len();
        let local_path_str = local_path.to_string_lossy().to_string();

        let mut doc = Node {
            local_path: Some(local_path_str.clone()),
            size: final_size,
            mtime: now_secs(),
            parts: Vec::new(),
            ..self.node.clone()
        };
        doc.name = self.name.clone();
        doc.parent = self.parent.clone();

        self.cache.put(&self.parent, &self.name, doc.clone()).await;
        // Best-effort: a metadata-store failure here must not fail the upload, the
        // cache already has the authoritative copy for this process (I3).
        let _ = self.store.replace(&self.parent, &self.name, doc.clone()).await;

        if !self.name.ends_with(".partial") && final_size > 0 {
            self.upload_tx
                .enqueue(UploadTask { local_path: local_path_str, filename: self.name.clone(), parent: self.parent.clone(), size: final_size })
                .await;
        }

        self.node = doc;
        Ok(final_size)
    }

    /// Yields blocks of up to `block_size` bytes, starting at the seek
    /// offset, from whichever representation is authoritative: local disk
    /// if `local_path` is present and exists, otherwise the blob store's
    /// ordered `parts`.
    pub async fn read_block(&mut self, block_size: usize) -> Result<Option<Vec<u8>>, Error> {
        if let Some(local_path) = self.node.local_path.clone() {
            if tokio::fs::metadata(&local_path).await.is_ok() {
                return self.read_block_from_disk(&local_path, block_size).await;
            }
        }
        self.read_block_from_parts(block_size).await
    }

    async fn read_block_from_disk(&mut self, local_path: &str, block_size: usize) -> Result<Option<Vec<u8>>, Error> {
        let mut file = tokio::fs::File::open(local_path).await?;
        file.seek(std::io::SeekFrom::Start(self.offset)).await?;
        let mut buf = vec![0u8; block_size];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.offset += n as u64;
        Ok(Some(buf))
    }

    async fn read_block_from_parts(&mut self, block_size: usize) -> Result<Option<Vec<u8>>, Error> {
        let mut parts = self.node.parts.clone();
        parts.sort_by_key(|p| p.part_id);
        let mut chunk_start: u64 = 0;
        for part in parts {
            let chunk_end = chunk_start + part.size as u64;
            if chunk_end <= self.offset {
                chunk_start = chunk_end;
                continue;
            }
            let local_offset = self.offset.saturating_sub(chunk_start);
            let bytes = self.blob.stream(&part.blob_id, local_offset).await.map_err(|e| Error::new(ErrorKind::IoFailure, e))?;
            if bytes.is_empty() {
                chunk_start = chunk_end;
                continue;
            }
            let take = bytes.len().min(block_size);
            let out = bytes[..take].to_vec();
            self.offset += take as u64;
            return Ok(Some(out));
        }
        Ok(None)
    }
}
