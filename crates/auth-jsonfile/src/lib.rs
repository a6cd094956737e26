//! A [`CredentialStore`](chunkftp::auth::CredentialStore) backed by a JSON
//! file of users, passwords, and permissions.
//!
//! ```json
//! [
//!   {
//!     "login": "alice",
//!     "password": "secret",
//!     "home_path": "/alice",
//!     "permissions": [
//!       { "path": "/alice/ro", "readable": true, "writable": false }
//!     ]
//!   }
//! ]
//! ```
//!
//! The password comparison is plain equality, matching the core crate's own
//! "not hardened here" authentication contract (§4.6); a real deployment is
//! expected to back [`chunkftp::auth::CredentialStore`] with whatever
//! secret-handling its directory service already does, the same split the
//! reference FTP engine draws between its pluggable `Authenticator` trait
//! and this crate's role as one reference implementation of it.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use chunkftp::auth::{CredentialStore, Permission, StoredUser};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct JsonPermission {
    path: String,
    #[serde(default)]
    readable: bool,
    #[serde(default)]
    writable: bool,
}

#[derive(Debug, Deserialize)]
struct JsonUser {
    login: String,
    password: String,
    home_path: Option<String>,
    #[serde(default)]
    permissions: Vec<JsonPermission>,
}

/// A [`CredentialStore`] that re-reads and parses its JSON file on every
/// lookup, so credential changes on disk take effect without a restart —
/// matching the reference engine's own `unftp-auth-jsonfile`, which favors
/// re-reading a small file over caching it.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    /// Builds a store that reads users from `path` on every lookup.
    pub fn new(path: impl Into<PathBuf>) -> JsonFileCredentialStore {
        JsonFileCredentialStore { path: path.into() }
    }

    async fn load(&self) -> std::io::Result<HashMap<String, JsonUser>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let users: Vec<JsonUser> = serde_json::from_slice(&bytes).map_err(std::io::Error::other)?;
        Ok(users.into_iter().map(|u| (u.login.clone(), u)).collect())
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn find_user_by_login(&self, login: &str) -> std::io::Result<Option<StoredUser>> {
        let users = self.load().await?;
        Ok(users.get(login).map(|u| StoredUser {
            login: u.login.clone(),
            password: u.password.clone(),
            home_path: u.home_path.clone(),
            permissions: u.permissions.iter().map(|p| Permission { path: p.path.clone(), readable: p.readable, writable: p.writable }).collect(),
        }))
    }
}

/// Reads and validates the file at `path` once at process startup, the way
/// an embedding binary typically wants to fail fast on a malformed
/// credentials file rather than discover it at the first login attempt.
pub async fn validate(path: &Path) -> std::io::Result<()> {
    let bytes = tokio::fs::read(path).await?;
    let _: Vec<JsonUser> = serde_json::from_slice(&bytes).map_err(std::io::Error::other)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[tokio::test]
    async fn finds_known_user() {
        let f = write_fixture(r#"[{"login":"alice","password":"secret","permissions":[]}]"#);
        let store = JsonFileCredentialStore::new(f.path());
        let user = store.find_user_by_login("alice").await.unwrap().unwrap();
        assert_eq!(user.password, "secret");
        assert_eq!(user.home_path, None);
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let f = write_fixture(r#"[{"login":"alice","password":"secret"}]"#);
        let store = JsonFileCredentialStore::new(f.path());
        assert!(store.find_user_by_login("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn carries_explicit_home_and_permissions() {
        let f = write_fixture(r#"[{"login":"bob","password":"p","home_path":"/srv/bob","permissions":[{"path":"/shared","readable":true,"writable":false}]}]"#);
        let store = JsonFileCredentialStore::new(f.path());
        let user = store.find_user_by_login("bob").await.unwrap().unwrap();
        assert_eq!(user.home_path.as_deref(), Some("/srv/bob"));
        assert_eq!(user.permissions.len(), 1);
        assert!(user.permissions[0].readable && !user.permissions[0].writable);
    }
}
