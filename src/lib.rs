#![deny(clippy::all)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

//! chunkftp is an async FTP front-end over a chunked, blob-backed object
//! store.
//!
//! It splits uploaded files into fixed-size chunks and hands them off to a
//! pluggable blob-messaging backend, keeping metadata (directory structure,
//! chunk locations) in a pluggable document store. It runs on top of the
//! Tokio asynchronous runtime.
//!
//! # Quick Start
//!
//! ```no_run
//! use chunkftp::ServerBuilder;
//! # use std::sync::Arc;
//! # async fn build<M: chunkftp::MetadataStore + 'static, B: chunkftp::BlobBackend + 'static, C: chunkftp::CredentialStore + 'static>(store: Arc<M>, blob: Arc<B>, creds: Arc<C>) {
//! let server = ServerBuilder::new(store, blob, creds, "staging", "primary-target")
//!     .greeting("Welcome to my FTP server")
//!     .build()
//!     .unwrap();
//!
//! server.listen("127.0.0.1:2121".parse().unwrap()).await.unwrap();
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod meta;
pub(crate) mod metrics;
pub mod path;
mod server;
pub mod upload;
pub mod vfs;

pub use crate::auth::CredentialStore;
pub use crate::error::{Error, ErrorKind};
pub use crate::meta::MetadataStore;
pub use crate::server::ftpserver::{error::ServerError, Server, ServerBuilder};
pub use crate::upload::blob::BlobBackend;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
