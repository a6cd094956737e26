//! Contains the [`Server`](crate::Server) builder that wires together the
//! VFS, auth service, upload pipeline, passive broker, and the per-session
//! control-channel loop.

pub(crate) mod controlchan;
pub(crate) mod ftpserver;
pub(crate) mod recovery;
pub(crate) mod session;
pub(crate) mod switchboard;
