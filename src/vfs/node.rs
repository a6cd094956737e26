//! The `Node` data model: a single VFS entry, directory or file.

use std::time::{SystemTime, UNIX_EPOCH};

/// A chunk of a file's bytes persisted to the blob backend.
///
/// Ordered by `part_id`; `size` of every chunk but the last equals the
/// configured chunk size (invariant I4 relies on these summing to
/// `Node::size`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRef {
    /// Zero-based, contiguous position of this chunk within the file.
    pub part_id: u32,
    /// Identifier of the blob-backend target this chunk was sent to.
    pub blob_id: String,
    /// Identifier of the message/object the blob backend returned.
    pub blob_msg_id: u64,
    /// Byte length of this chunk.
    pub size: u32,
    /// The chunk's own name, `<file_uuid>.part_<part_id:03}>`.
    pub chunk_name: String,
}

/// Whether a file's bytes currently live in staging or have been fully
/// persisted to the blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Authoritative bytes are `Node::local_path` on local disk.
    Staging,
    /// Authoritative bytes are `Node::parts` in the blob store.
    Completed,
}

/// Directory or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// A directory.
    Dir,
    /// A file, staging or completed.
    File,
}

/// A single VFS entry: a directory or a file, staging or completed.
///
/// Exactly one of `local_path`, `parts` is non-empty for a completed file;
/// during upload both may briefly coexist until the metadata swap (§4.7).
#[derive(Debug, Clone)]
pub struct Node {
    /// Directory or file.
    pub node_type: NodeType,
    /// Leaf name, non-empty, NFC-normalized. Empty only for the synthetic root.
    pub name: String,
    /// Absolute POSIX parent path; `"/"` for root children.
    pub parent: String,
    /// Seconds since epoch.
    pub ctime: i64,
    /// Seconds since epoch.
    pub mtime: i64,
    /// Byte length; always 0 for directories.
    pub size: u64,
    /// Present iff the file's bytes currently live in the staging directory.
    pub local_path: Option<String>,
    /// Present iff the file has been fully persisted to the blob store.
    pub parts: Vec<ChunkRef>,
}

impl Node {
    /// The derived absolute path: `parent` joined with `name`.
    pub fn path(&self) -> String {
        if self.parent == "/" {
            format!("/{}", self.name)
        } else {
            format!("{}/{}", self.parent, self.name)
        }
    }

    /// Current status, derived from which of `local_path`/`parts` holds the
    /// authoritative bytes. Files created but not yet written by either path
    /// report `Staging`.
    pub fn status(&self) -> FileStatus {
        if self.parts.is_empty() {
            FileStatus::Staging
        } else {
            FileStatus::Completed
        }
    }

    /// The synthetic root directory node, returned by `get_node("/")` and
    /// `get_node(".")` without a store round-trip.
    pub fn root() -> Node {
        let now = now_secs();
        Node {
            node_type: NodeType::Dir,
            name: String::new(),
            parent: "/".to_string(),
            ctime: now,
            mtime: now,
            size: 0,
            local_path: None,
            parts: Vec::new(),
        }
    }

    /// A freshly created directory doc for `mkdir`.
    pub fn new_dir(parent: &str, name: &str) -> Node {
        let now = now_secs();
        Node {
            node_type: NodeType::Dir,
            name: name.to_string(),
            parent: parent.to_string(),
            ctime: now,
            mtime: now,
            size: 0,
            local_path: None,
            parts: Vec::new(),
        }
    }

    /// A freshly (re)created file doc for `open(mode="wb")`: `size=0`, no
    /// parts, no local_path until `write_stream` records one.
    pub fn new_file_for_write(parent: &str, name: &str) -> Node {
        let now = now_secs();
        Node {
            node_type: NodeType::File,
            name: name.to_string(),
            parent: parent.to_string(),
            ctime: now,
            mtime: now,
            size: 0,
            local_path: None,
            parts: Vec::new(),
        }
    }

    /// Synthesized POSIX mode bits: `0o100666` for files, `0o40777` for
    /// directories (§4.4 `stat`).
    pub fn mode_bits(&self) -> u32 {
        match self.node_type {
            NodeType::File => 0o100_666,
            NodeType::Dir => 0o40_777,
        }
    }
}

pub(crate) fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}
