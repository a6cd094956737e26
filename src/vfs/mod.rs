//! The virtual filesystem (component D): the single entry point every
//! control-channel command goes through to resolve, create, list, and
//! mutate nodes, backed by the cache (C), the metadata store (B), and the
//! upload queue (F).

pub mod node;
pub mod staging;

pub use node::{ChunkRef, FileStatus, Node, NodeType};
pub use staging::{OpenMode, StagingHandle};

use crate::error::{Error, ErrorKind};
use crate::meta::{Cache, MetadataStore};
use crate::path;
use crate::upload::blob::BlobBackend;
use crate::upload::queue::{UploadSender, UploadTask};
use std::path::PathBuf;
use std::sync::Arc;

/// Ties the cache, metadata store, blob backend, and upload queue together
/// behind the operations every command handler calls.
#[derive(Debug)]
pub struct Vfs<M, B> {
    store: Arc<M>,
    cache: Arc<Cache>,
    blob: Arc<B>,
    upload_tx: UploadSender,
    staging_dir: PathBuf,
}

impl<M: MetadataStore, B: BlobBackend> Vfs<M, B> {
    /// Builds a VFS over the given collaborators.
    pub fn new(store: Arc<M>, cache: Arc<Cache>, blob: Arc<B>, upload_tx: UploadSender, staging_dir: PathBuf) -> Self {
        Vfs { store, cache, blob, upload_tx, staging_dir }
    }

    /// Resolves `virtual_path` to a node: cache, then store, then the
    /// legacy leading-slash-stripped parent fallback baked into the cache
    /// itself. Returns the synthetic root for `/` or `.` without a store
    /// round-trip. Returns `Ok(None)` if nothing resolves.
    pub async fn get_node(&self, virtual_path: &str) -> Result<Option<Node>, Error> {
        let canon = path::canonicalize(virtual_path);
        if canon == "/" {
            return Ok(Some(Node::root()));
        }
        let (parent, name) = path::split(&canon);
        if let Some(node) = self.cache.get(&parent, &name).await {
            return Ok(Some(node));
        }
        let node = self.store.find_one(&parent, &name).await.map_err(Error::from)?;
        if let Some(n) = &node {
            self.cache.put(&parent, &name, n.clone()).await;
        }
        Ok(node)
    }

    /// Creates a directory doc at `virtual_path`. If one already exists,
    /// succeeds silently when `exist_ok`, otherwise fails with
    /// [`ErrorKind::Exists`].
    pub async fn mkdir(&self, virtual_path: &str, exist_ok: bool) -> Result<(), Error> {
        let canon = path::canonicalize(virtual_path);
        let (parent, name) = path::split(&canon);
        let doc = Node::new_dir(&parent, &name);
        let inserted = self.store.insert(doc.clone()).await.map_err(Error::from)?;
        if inserted {
            self.cache.put(&parent, &name, doc).await;
            Ok(())
        } else if exist_ok {
            Ok(())
        } else {
            Err(ErrorKind::Exists.into())
        }
    }

    /// Removes the directory doc at `virtual_path` and cascade-deletes
    /// every descendant whose `parent` has the directory's path as a
    /// prefix. The directory's own cache entry is dropped; descendants are
    /// left to re-resolve as absent rather than explicitly purged.
    pub async fn rmdir(&self, virtual_path: &str) -> Result<(), Error> {
        let canon = path::canonicalize(virtual_path);
        let (parent, name) = path::split(&canon);
        self.store.delete_one(&parent, &name).await.map_err(Error::from)?;
        self.store.delete_many_under(&canon).await.map_err(Error::from)?;
        self.cache.remove(&parent, &name).await;
        self.cache.remove_under(&canon).await;
        Ok(())
    }

    /// Removes a file: drops the cache entry, best-effort deletes its
    /// staging file if one is still present, deletes the metadata doc.
    pub async fn unlink(&self, virtual_path: &str) -> Result<(), Error> {
        let canon = path::canonicalize(virtual_path);
        let (parent, name) = path::split(&canon);
        if let Some(node) = self.get_node(&canon).await? {
            if let Some(local_path) = &node.local_path {
                let _ = tokio::fs::remove_file(local_path).await;
            }
        }
        self.cache.remove(&parent, &name).await;
        self.store.delete_one(&parent, &name).await.map_err(Error::from)?;
        Ok(())
    }

    /// Lists the immediate children of the directory at `virtual_path`.
    pub async fn list(&self, virtual_path: &str) -> Result<Vec<Node>, Error> {
        let canon = path::canonicalize(virtual_path);
        self.store.list(&canon).await.map_err(Error::from)
    }

    /// Resolves a node for `stat`-style reporting; an alias for
    /// [`Vfs::get_node`] kept distinct so command handlers can name their
    /// intent.
    pub async fn stat(&self, virtual_path: &str) -> Result<Option<Node>, Error> {
        self.get_node(virtual_path).await
    }

    /// Opens `virtual_path` for reading or writing, returning a
    /// [`StagingHandle`] bound to the resolved (or freshly created) node.
    ///
    /// `mode = Write` always creates a fresh file doc (truncating any
    /// existing one's record, though its bytes are only replaced once
    /// `write_stream` runs); `mode = Read` requires an existing file node.
    pub async fn open(&self, virtual_path: &str, mode: OpenMode) -> Result<StagingHandle<M, B>, Error> {
        let canon = path::canonicalize(virtual_path);
        let (parent, name) = path::split(&canon);

        let node = match mode {
            OpenMode::Write => {
                let doc = Node::new_file_for_write(&parent, &name);
                self.cache.put(&parent, &name, doc.clone()).await;
                doc
            }
            OpenMode::Read => match self.get_node(&canon).await? {
                Some(n) if n.node_type == NodeType::File => n,
                Some(_) => return Err(ErrorKind::NotAFile.into()),
                None => return Err(ErrorKind::NotFound.into()),
            },
        };

        Ok(StagingHandle::new(
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            Arc::clone(&self.blob),
            self.upload_tx.clone(),
            self.staging_dir.clone(),
            node,
            parent,
            name,
            mode,
        ))
    }

    /// Renames `src` to `dst`, atomic from the metadata store's point of
    /// view: the cache entry moves under a single lock acquisition, then
    /// the store is updated. If the source is not found this is a no-op,
    /// not an error (the caller logs a warning).
    ///
    /// If `src`'s name ends in `.partial` and `dst`'s does not, and the
    /// node still has a `local_path` on disk, this is the hand-off point
    /// (I5): a staging file is enqueued for upload under the destination
    /// identity.
    pub async fn rename(&self, src: &str, dst: &str) -> Result<(), Error> {
        let src_canon = path::canonicalize(src);
        let dst_canon = path::canonicalize(dst);
        let (old_parent, old_name) = path::split(&src_canon);
        let (new_parent, new_name) = path::split(&dst_canon);

        let Some(mut node) = self.get_node(&src_canon).await? else {
            return Ok(());
        };

        node.parent = new_parent.clone();
        node.name = new_name.clone();
        node.mtime = node::now_secs();

        self.cache.rename(&old_parent, &old_name, &new_parent, &new_name, node.clone()).await;
        self.store.update_identity(&old_parent, &old_name, node.clone()).await.map_err(Error::from)?;

        let was_partial = old_name.ends_with(".partial");
        let becomes_final = !new_name.ends_with(".partial");
        if was_partial && becomes_final {
            if let Some(local_path) = node.local_path.clone() {
                if tokio::fs::metadata(&local_path).await.is_ok() {
                    self.upload_tx
                        .enqueue(UploadTask { local_path, filename: new_name, parent: new_parent, size: node.size })
                        .await;
                }
            }
        }

        Ok(())
    }
}
