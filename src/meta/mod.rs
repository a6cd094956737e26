//! The metadata store adapter (component B): a typed CRUD interface over
//! the document collection backing [`crate::vfs::Node`], plus the
//! process-wide write-through cache in front of it (component C).

pub(crate) mod cache;

use crate::vfs::node::Node;
use async_trait::async_trait;
use std::fmt::Debug;

pub use cache::Cache;

/// A document-store adapter operating on a single logical collection of
/// `Node` documents keyed by `(parent, name)`.
///
/// Implementations must enforce a unique compound index on `(parent,
/// name)`: [`MetadataStore::insert`] is the sole signal of "already
/// exists", surfaced by returning `Ok(false)` rather than an error, so that
/// callers (notably `mkdir(exist_ok)`) can decide what to do about it
/// without paying for an exception-shaped control flow.
///
/// A real deployment backs this with whatever document database it likes;
/// this crate ships one process-local, in-memory implementation
/// (`meta-store-memory`) for tests and small deployments, the way the
/// reference FTP engine ships a local-filesystem storage back-end behind
/// its own abstract trait.
#[async_trait]
pub trait MetadataStore: Send + Sync + Debug {
    /// Looks up the document at `(parent, name)`.
    async fn find_one(&self, parent: &str, name: &str) -> std::io::Result<Option<Node>>;

    /// Inserts a new document. Returns `Ok(false)` without mutating
    /// anything if `(parent, name)` already exists (unique-index
    /// violation); the insert otherwise always succeeds.
    async fn insert(&self, node: Node) -> std::io::Result<bool>;

    /// Upserts the document at `(parent, name)`, replacing it wholesale.
    async fn replace(&self, parent: &str, name: &str, node: Node) -> std::io::Result<()>;

    /// Updates `parent`/`name`/`mtime` (and anything else the caller
    /// mutated) on the document identified by its current `(old_parent,
    /// old_name)`, moving it to `(new_parent, new_name)` atomically from
    /// the store's point of view.
    async fn update_identity(&self, old_parent: &str, old_name: &str, node: Node) -> std::io::Result<()>;

    /// Deletes the document at `(parent, name)` if present. Idempotent: a
    /// missing document is not an error.
    async fn delete_one(&self, parent: &str, name: &str) -> std::io::Result<()>;

    /// Deletes every document whose `parent` equals `prefix` or is nested
    /// under it (`rmdir`'s cascade delete).
    async fn delete_many_under(&self, prefix: &str) -> std::io::Result<()>;

    /// Lists the immediate children of `parent` whose name does not end in
    /// `.partial` (invariant I2).
    async fn list(&self, parent: &str) -> std::io::Result<Vec<Node>>;

    /// Every document that is either `status=staging` or still has a
    /// `local_path`, used by restart recovery (component K).
    async fn find_pending(&self) -> std::io::Result<Vec<Node>>;
}
