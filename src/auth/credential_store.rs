//! The credential-lookup contract: an external collaborator the core only
//! ever reads from.

use crate::auth::user::Permission;
use async_trait::async_trait;
use std::fmt::Debug;

/// What a credential store hands back for a known login: the password to
/// check equality against, an optional home directory override, and the
/// permission rules to seed the resulting [`crate::auth::UserDetail`] with.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// The login name, echoed back for convenience.
    pub login: String,
    /// Plaintext password to compare against what `PASS` supplied.
    ///
    /// Plain equality, not hardened here; a real deployment backs this
    /// store with whatever secret-handling its credential source already
    /// does.
    pub password: String,
    /// Home directory; defaults to `/<login>` if the store leaves this unset.
    pub home_path: Option<String>,
    /// Explicit permission rules for this user.
    pub permissions: Vec<Permission>,
}

/// Read-only lookup of a user's stored credentials and permissions.
///
/// This crate defines the trait and ships one in-memory / JSON-file-backed
/// reference implementation (`auth-jsonfile`) for tests and small
/// deployments; a real deployment is expected to back this with whatever
/// directory service it already runs, the way the reference codebase
/// treats its storage back-end as a pluggable collaborator behind a trait.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Looks up `login`, returning `None` if no such user exists.
    async fn find_user_by_login(&self, login: &str) -> std::io::Result<Option<StoredUser>>;
}
