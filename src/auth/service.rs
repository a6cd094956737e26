//! Wires the credential store and the connection-quota tracker together
//! into the `USER`/`PASS` login sequence (component G).

use crate::auth::available_connections::AvailableConnections;
use crate::auth::credential_store::CredentialStore;
use crate::auth::user::UserDetail;
use crate::error::Error;
use std::sync::Arc;

/// What `AuthService::get_user` found for a login attempt.
#[derive(Debug)]
pub enum GetUserOutcome {
    /// The login exists and has an available connection slot; `PASS` is
    /// now expected.
    PasswordRequired(PendingLogin),
    /// The login is unknown, or the user's connection quota is exhausted.
    /// Carries the message a client-facing reply can surface verbatim.
    Error(String),
}

/// A login in progress: the resolved user detail plus the stored password
/// to compare `PASS` against. Holding the password here (rather than
/// re-querying the store on `PASS`) keeps the comparison a single plain
/// equality, per the authentication contract.
#[derive(Debug)]
pub struct PendingLogin {
    /// The identity that will become the session's user on success.
    pub user: UserDetail,
    password: String,
}

impl PendingLogin {
    /// Plain equality against the password supplied at `PASS`. Not
    /// hardened further; credential handling is the store's concern.
    pub fn authenticate(&self, password: &str) -> bool {
        self.password == password
    }
}

/// The login/logout surface: looks up users, tracks their connection
/// quota, and builds [`UserDetail`]s out of [`crate::auth::credential_store::StoredUser`] records.
#[derive(Debug)]
pub struct AuthService<C> {
    store: Arc<C>,
    connections: AvailableConnections,
}

impl<C: CredentialStore> AuthService<C> {
    /// Builds a service over `store`, with `default_quota` connection
    /// slots per user (§6: 100).
    pub fn new(store: Arc<C>, default_quota: u32) -> AuthService<C> {
        AuthService { store, connections: AvailableConnections::new(default_quota) }
    }

    /// Looks up `login`. On success, claims one connection slot and
    /// returns the pending login; the caller releases the slot later via
    /// [`AuthService::notify_logout`].
    pub async fn get_user(&self, login: &str) -> Result<GetUserOutcome, Error> {
        let Some(stored) = self.store.find_user_by_login(login).await.map_err(Error::from)? else {
            return Ok(GetUserOutcome::Error("no such user".to_string()));
        };
        if !self.connections.try_acquire(login) {
            return Ok(GetUserOutcome::Error("too many connections".to_string()));
        }
        let home_path = stored.home_path.clone().unwrap_or_else(|| format!("/{login}"));
        let user = UserDetail::new(stored.login.clone(), home_path, stored.permissions.clone());
        Ok(GetUserOutcome::PasswordRequired(PendingLogin { user, password: stored.password }))
    }

    /// Releases the connection slot claimed by a prior [`AuthService::get_user`]
    /// call, whether or not the login ultimately succeeded.
    pub fn notify_logout(&self, login: &str) {
        self.connections.release(login);
    }
}
