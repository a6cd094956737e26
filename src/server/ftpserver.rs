//! Contains the [`Server`](crate::Server) struct and its builder, tying
//! together the VFS, auth service, upload pipeline, passive broker, and the
//! per-session control-channel loop (component O).

pub mod error;
pub(crate) mod options;

use crate::auth::{AuthService, CredentialStore};
use crate::meta::{Cache, MetadataStore};
use crate::server::controlchan::control_loop::{run_session, SessionContext};
use crate::server::recovery;
use crate::server::session::Connection;
use crate::server::switchboard::Switchboard;
use crate::upload::blob::BlobBackend;
use crate::upload::queue::{self, UploadSender};
use crate::upload::worker::{self, WorkerConfig};
use crate::vfs::Vfs;
use error::ServerError;
use slog::Drain;
use options::{DEFAULT_CHUNK_SIZE, DEFAULT_CONNECTION_CAP, DEFAULT_GREETING, DEFAULT_MAX_RETRIES, DEFAULT_PASSIVE_PORTS, DEFAULT_UPLOAD_QUEUE_CAPACITY, DEFAULT_USER_QUOTA, DEFAULT_WORKER_COUNT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// Builds a [`Server`] over the three required collaborators (metadata
/// store, blob backend, credential store) and a staging directory, with
/// chained setters for every other knob enumerated in §6. Validation
/// happens at [`ServerBuilder::build`], never by silently clamping (P10).
pub struct ServerBuilder<M, B, C> {
    store: Arc<M>,
    blob: Arc<B>,
    credentials: Arc<C>,
    staging_dir: PathBuf,
    greeting: String,
    passive_ports: RangeInclusive<u16>,
    masquerade_addr: Option<IpAddr>,
    chunk_size: u64,
    max_retries: u32,
    worker_count: usize,
    backup_target: Option<String>,
    blob_target: String,
    connection_cap: usize,
    user_quota: u32,
    upload_queue_capacity: usize,
    logger: slog::Logger,
}

impl<M, B, C> ServerBuilder<M, B, C>
where
    M: MetadataStore + 'static,
    B: BlobBackend + 'static,
    C: CredentialStore + 'static,
{
    /// Starts a builder over the three required collaborators and a
    /// staging directory. `blob_target` names the primary blob-backend
    /// destination every chunk push goes to.
    pub fn new(store: Arc<M>, blob: Arc<B>, credentials: Arc<C>, staging_dir: impl Into<PathBuf>, blob_target: impl Into<String>) -> Self {
        ServerBuilder {
            store,
            blob,
            credentials,
            staging_dir: staging_dir.into(),
            greeting: DEFAULT_GREETING.to_string(),
            passive_ports: DEFAULT_PASSIVE_PORTS,
            masquerade_addr: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            worker_count: DEFAULT_WORKER_COUNT,
            backup_target: None,
            blob_target: blob_target.into(),
            connection_cap: DEFAULT_CONNECTION_CAP,
            user_quota: DEFAULT_USER_QUOTA,
            upload_queue_capacity: DEFAULT_UPLOAD_QUEUE_CAPACITY,
            logger: slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!()),
        }
    }

    /// Overrides the `220` greeting line.
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Overrides the inclusive passive-mode port range.
    pub fn passive_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.passive_ports = ports;
        self
    }

    /// Sets the IP address `PASV`/`EPSV` advertise, overriding the
    /// connection-derived default, for servers behind NAT.
    pub fn masquerade_addr(mut self, addr: IpAddr) -> Self {
        self.masquerade_addr = Some(addr);
        self
    }

    /// Overrides the per-chunk size in bytes.
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Overrides the maximum per-chunk retry count before a file is
    /// abandoned to the next restart recovery pass.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Overrides the upload worker pool size.
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Configures a backup blob-backend target; chunk copies here are
    /// best-effort and never fail an upload.
    pub fn backup_target(mut self, target: impl Into<String>) -> Self {
        self.backup_target = Some(target.into());
        self
    }

    /// Overrides the server-wide concurrent connection cap (§6 default 256).
    pub fn connection_cap(mut self, cap: usize) -> Self {
        self.connection_cap = cap;
        self
    }

    /// Overrides the per-user connection quota (§6 default 100).
    pub fn user_quota(mut self, quota: u32) -> Self {
        self.user_quota = quota;
        self
    }

    /// Overrides the upload hand-off queue's capacity.
    pub fn upload_queue_capacity(mut self, capacity: usize) -> Self {
        self.upload_queue_capacity = capacity;
        self
    }

    /// Supplies the logger every long-lived component derives its child
    /// loggers from (§4.13).
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Validates the configuration and builds a [`Server`] (P10): a
    /// worker count, passive port range, or chunk size of zero is a
    /// builder error, never silently clamped.
    pub fn build(self) -> Result<Server<M, B, C>, ServerError> {
        if self.worker_count == 0 {
            return Err(ServerError::validation("worker_count must be at least 1"));
        }
        if self.passive_ports.is_empty() {
            return Err(ServerError::validation("passive_ports must not be empty"));
        }
        if self.chunk_size == 0 {
            return Err(ServerError::validation("chunk_size must be greater than 0"));
        }
        if self.connection_cap == 0 {
            return Err(ServerError::validation("connection_cap must be at least 1"));
        }

        let cache = Arc::new(Cache::new());
        let (upload_tx, upload_rx) = queue::channel(self.upload_queue_capacity);
        let vfs = Arc::new(Vfs::new(Arc::clone(&self.store), Arc::clone(&cache), Arc::clone(&self.blob), upload_tx.clone(), self.staging_dir));
        let auth = Arc::new(AuthService::new(self.credentials, self.user_quota));
        let switchboard = Arc::new(Switchboard::new(self.logger.new(slog::o!("component" => "switchboard")), self.passive_ports));

        let worker_config = WorkerConfig { chunk_size: self.chunk_size, max_retries: self.max_retries, blob_target: self.blob_target, backup_target: self.backup_target };

        Ok(Server {
            store: self.store,
            blob: self.blob,
            cache,
            vfs,
            auth,
            switchboard,
            upload_tx,
            upload_rx: Some(upload_rx),
            worker_config,
            worker_count: self.worker_count,
            connection_cap: self.connection_cap,
            greeting: self.greeting,
            masquerade_addr: self.masquerade_addr,
            logger: self.logger,
        })
    }
}

/// An FTP server instance, ready to accept connections via [`Server::listen`].
pub struct Server<M, B, C> {
    store: Arc<M>,
    blob: Arc<B>,
    cache: Arc<Cache>,
    vfs: Arc<Vfs<M, B>>,
    auth: Arc<AuthService<C>>,
    switchboard: Arc<Switchboard>,
    upload_tx: UploadSender,
    upload_rx: Option<queue::UploadReceiver>,
    worker_config: WorkerConfig,
    worker_count: usize,
    connection_cap: usize,
    greeting: String,
    masquerade_addr: Option<IpAddr>,
    logger: slog::Logger,
}

impl<M, B, C> Server<M, B, C>
where
    M: MetadataStore + 'static,
    B: BlobBackend + 'static,
    C: CredentialStore + 'static,
{
    /// Runs restart recovery (K), starts the upload worker pool, then
    /// accepts control connections on `bind_address` until the process is
    /// terminated. Each accepted connection is gated by the connection-cap
    /// semaphore (P8): once the cap is reached, new connections receive
    /// `421` and are closed immediately.
    pub async fn listen(mut self, bind_address: SocketAddr) -> Result<(), ServerError> {
        recovery::recover(self.store.as_ref(), &self.upload_tx, &self.logger).await;

        let upload_rx = self.upload_rx.take().expect("listen is only ever called once");
        for worker_id in 0..self.worker_count {
            let logger = self.logger.new(slog::o!("component" => "upload-worker", "worker_id" => worker_id));
            let rx = upload_rx.clone();
            let store = Arc::clone(&self.store);
            let cache = Arc::clone(&self.cache);
            let blob = Arc::clone(&self.blob);
            let config = self.worker_config.clone();
            tokio::spawn(async move {
                worker::run(rx, store, cache, blob, config, logger).await;
            });
        }

        let listener = TcpListener::bind(bind_address).await?;
        let server_host = match bind_address.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ip => ip,
        };
        let cap = Arc::new(Semaphore::new(self.connection_cap));

        slog::info!(self.logger, "listening"; "address" => %bind_address);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    slog::warn!(self.logger, "accept failed"; "error" => %e);
                    continue;
                }
            };

            let permit = match Arc::clone(&cap).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    crate::metrics::inc_connections_rejected();
                    let mut framed = tokio_util::codec::Framed::new(stream, crate::server::controlchan::codecs::FtpCodec::new());
                    use futures_util::SinkExt;
                    let _ = framed
                        .send(crate::server::controlchan::reply::Reply::single(crate::server::controlchan::reply::ReplyCode::ServiceNotAvailable, "too many connections"))
                        .await;
                    continue;
                }
            };

            crate::metrics::inc_connections_accepted();
            let session_logger = self.logger.new(slog::o!("peer" => peer.to_string()));
            let ctx = Arc::new(SessionContext {
                vfs: Arc::clone(&self.vfs),
                auth: Arc::clone(&self.auth),
                switchboard: Arc::clone(&self.switchboard),
                conn: Arc::new(Connection::new(peer)),
                masquerade_addr: self.masquerade_addr,
                server_host,
                logger: session_logger,
            });
            let greeting = self.greeting.clone();
            tokio::spawn(async move {
                run_session(stream, ctx, greeting).await;
                drop(permit);
            });
        }
    }
}
