//! User identity, per-path permissions, credential lookup, and connection
//! quotas (component G).
//!
//! The core only ever reads from a [`CredentialStore`]; this crate ships
//! `auth-jsonfile` as one reference implementation for tests and small
//! deployments, the way the reference FTP engine ships pluggable
//! authentication back-ends behind its own trait.

mod available_connections;
mod credential_store;
mod service;
mod user;

pub use available_connections::AvailableConnections;
pub use credential_store::{CredentialStore, StoredUser};
pub use service::{AuthService, GetUserOutcome, PendingLogin};
pub use user::{Permission, UserDetail};
