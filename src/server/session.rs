//! Per-connection state (component H): the "awaitable slots" a command's
//! preconditions are gated on.
//!
//! Grounded on `failed_logins.rs`'s `Arc<RwLock<HashMap<..>>>` guard
//! discipline, generalized from a single cache entry to the small set of
//! named slots (`user`, `logged`, `current_directory`, `rename_from`,
//! `restart_offset`, `data_connection`) a session actually carries.

use crate::auth::{PendingLogin, UserDetail};
use crate::error::{Error, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};
use tokio::time::Duration;

/// The data-connection gate's window: a passive accept that races with the
/// command that needs it gets up to this long before `425` (§4.8).
const DATA_CONNECTION_GATE_TIMEOUT: Duration = Duration::from_secs(1);

struct ConnectionState {
    user: Option<String>,
    pending_login: Option<PendingLogin>,
    identity: Option<UserDetail>,
    current_directory: String,
    rename_from: Option<String>,
    restart_offset: u64,
    passive_addr: Option<SocketAddr>,
    data_stream: Option<TcpStream>,
    transfer_cancel: Option<Arc<Notify>>,
}

impl ConnectionState {
    fn new() -> ConnectionState {
        ConnectionState {
            user: None,
            pending_login: None,
            identity: None,
            current_directory: "/".to_string(),
            rename_from: None,
            restart_offset: 0,
            passive_addr: None,
            data_stream: None,
            transfer_cancel: None,
        }
    }
}

/// Everything the control loop and command handlers need to know about one
/// client's session, plus the synchronization primitive (`Notify`) that
/// lets a late-arriving passive accept wake up the command awaiting it.
pub struct Connection {
    peer_addr: SocketAddr,
    state: Mutex<ConnectionState>,
    data_notify: Notify,
}

impl Connection {
    /// Starts a fresh, unauthenticated session for a newly accepted peer.
    pub fn new(peer_addr: SocketAddr) -> Connection {
        Connection { peer_addr, state: Mutex::new(ConnectionState::new()), data_notify: Notify::new() }
    }

    /// The remote address of the control connection, used as the passive
    /// broker's claim key (§4.10) and for log correlation.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Records the login name presented at `USER` and the pending login
    /// `AuthService::get_user` produced for it, clearing any previous
    /// login state (a second `USER` restarts the login sequence).
    pub async fn set_user(&self, user: &str, pending: PendingLogin) {
        let mut guard = self.state.lock().await;
        guard.user = Some(user.to_string());
        guard.pending_login = Some(pending);
        guard.identity = None;
    }

    /// Takes the login name presented at `USER`, clearing it. Used to
    /// release the connection-quota slot `AuthService::get_user` claimed at
    /// `USER` exactly once per session: a failed `PASS` and end-of-session
    /// teardown both call this, but only the first one observes `Some` —
    /// the second sees the slot already cleared and does nothing, so the
    /// quota is never released twice for the same login.
    pub async fn take_login_for_quota_release(&self) -> Option<String> {
        self.state.lock().await.user.take()
    }

    /// `user_required` gate (§4.8): fails fast with `BadSequence` if no
    /// `USER` has been seen yet. Consumes and returns the pending login so
    /// `PASS` can authenticate it; a repeated `PASS` without an
    /// intervening `USER` fails the same way.
    pub async fn take_pending_login(&self) -> Result<PendingLogin, Error> {
        self.state.lock().await.pending_login.take().ok_or_else(|| ErrorKind::BadSequence.into())
    }

    /// Marks the session as fully authenticated with the given identity,
    /// starting it at its home directory.
    pub async fn set_logged_in(&self, identity: UserDetail) {
        let mut guard = self.state.lock().await;
        guard.current_directory = identity.home_path.clone();
        guard.identity = Some(identity);
    }

    /// `login_required` gate (§4.8): fails fast with `BadSequence` unless
    /// `PASS` has already succeeded, returning the session's identity.
    pub async fn require_login(&self) -> Result<UserDetail, Error> {
        self.state.lock().await.identity.clone().ok_or_else(|| ErrorKind::BadSequence.into())
    }

    /// The session's current virtual working directory.
    pub async fn cwd(&self) -> String {
        self.state.lock().await.current_directory.clone()
    }

    /// Replaces the session's current virtual working directory.
    pub async fn set_cwd(&self, path: &str) {
        self.state.lock().await.current_directory = path.to_string();
    }

    /// Records the source of a pending `RNFR`/`RNTO` pair.
    pub async fn set_rename_from(&self, path: &str) {
        self.state.lock().await.rename_from = Some(path.to_string());
    }

    /// `rename_from_required` gate (§4.8): consumes and returns the path
    /// set by a prior `RNFR`, or fails with `BadSequence` if none is
    /// pending. Consuming rather than peeking matches the one-shot nature
    /// of the RNFR/RNTO pair.
    pub async fn take_rename_from(&self) -> Result<String, Error> {
        self.state.lock().await.rename_from.take().ok_or_else(|| ErrorKind::BadSequence.into())
    }

    /// Sets the byte offset a subsequent `STOR`/`RETR`/`APPE` should
    /// resume from, per `REST`.
    pub async fn set_restart_offset(&self, offset: u64) {
        self.state.lock().await.restart_offset = offset;
    }

    /// Consumes and returns the pending restart offset, resetting it to 0;
    /// `REST` applies to exactly one subsequent transfer command.
    pub async fn take_restart_offset(&self) -> u64 {
        std::mem::take(&mut self.state.lock().await.restart_offset)
    }

    /// Records the address a `PASV`/`EPSV` listener was bound to.
    pub async fn set_passive_addr(&self, addr: SocketAddr) {
        self.state.lock().await.passive_addr = Some(addr);
    }

    /// `passive_server_started` gate (§4.8): fails fast with
    /// `BadSequence` unless a passive listener has already been opened.
    pub async fn require_passive_addr(&self) -> Result<SocketAddr, Error> {
        self.state.lock().await.passive_addr.ok_or_else(|| ErrorKind::BadSequence.into())
    }

    /// Hands the accepted data-channel socket to whichever command is
    /// waiting on it, and wakes any such waiter. If a data connection is
    /// already present, the new one is dropped (§4.10).
    pub async fn fulfill_data_connection(&self, stream: TcpStream) {
        let mut guard = self.state.lock().await;
        if guard.data_stream.is_some() {
            return;
        }
        guard.data_stream = Some(stream);
        drop(guard);
        self.data_notify.notify_waiters();
    }

    /// Records the cancellation signal of the in-flight `STOR`/`RETR`/
    /// `APPE`/`LIST`/`MLSD` transfer, so a subsequent `ABOR` can wake it.
    /// The transfer task itself, not this session, sends the `426`/`226`
    /// pair once it notices the signal (§5, §7) — `JoinHandle::abort`
    /// would drop the task without giving it the chance to reply.
    pub async fn set_transfer_task(&self, cancel: Arc<Notify>) {
        self.state.lock().await.transfer_cancel = Some(cancel);
    }

    /// Drops the cancellation signal once the transfer has completed on
    /// its own, so `ABOR` does not try to cancel a task that already
    /// finished.
    pub async fn clear_transfer_task(&self) {
        self.state.lock().await.transfer_cancel = None;
    }

    /// `ABOR` (§4.10): wakes the in-flight transfer task's cancellation
    /// signal, if any. Returns whether a transfer was actually cancelled.
    pub async fn abort_transfer(&self) -> bool {
        let cancel = self.state.lock().await.transfer_cancel.take();
        match cancel {
            Some(c) => {
                c.notify_one();
                true
            }
            None => false,
        }
    }

    /// `data_connection_made` gate with `wait=true` (§4.8): returns the
    /// accepted socket if it is already present, otherwise waits up to
    /// one second for the passive broker to fulfill it before failing
    /// with `DataChannelMissing` (425).
    pub async fn take_data_connection(&self) -> Result<TcpStream, Error> {
        let notified = self.data_notify.notified();
        {
            let mut guard = self.state.lock().await;
            if let Some(stream) = guard.data_stream.take() {
                return Ok(stream);
            }
        }
        if tokio::time::timeout(DATA_CONNECTION_GATE_TIMEOUT, notified).await.is_err() {
            return Err(ErrorKind::DataChannelMissing.into());
        }
        self.state.lock().await.data_stream.take().ok_or_else(|| ErrorKind::DataChannelMissing.into())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("peer_addr", &self.peer_addr).finish_non_exhaustive()
    }
}
