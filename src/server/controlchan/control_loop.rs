//! The per-session dispatch loop (component I): reads one command at a
//! time off the control channel, dispatches it, and writes back whatever
//! reply arrives on the session's reply queue — its own reply or, for a
//! transfer command, the reply its background task sends once done.

use crate::auth::{AuthService, CredentialStore};
use crate::meta::MetadataStore;
use crate::server::controlchan::codecs::FtpCodec;
use crate::server::controlchan::commands::dispatch;
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::server::session::Connection;
use crate::server::switchboard::Switchboard;
use crate::upload::blob::BlobBackend;
use crate::vfs::Vfs;
use futures_util::{SinkExt, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

/// Everything a command handler needs: the VFS, the auth service, the
/// passive-port broker, this session's connection state, and the addresses
/// `PASV`/`EPSV` advertise.
pub(crate) struct SessionContext<M, B, C> {
    pub vfs: Arc<Vfs<M, B>>,
    pub auth: Arc<AuthService<C>>,
    pub switchboard: Arc<Switchboard>,
    pub conn: Arc<Connection>,
    /// Overrides the advertised passive-mode IP, for servers behind NAT.
    pub masquerade_addr: Option<IpAddr>,
    /// The address `PASV`/`EPSV` advertise when no masquerade address is set.
    pub server_host: IpAddr,
    pub logger: slog::Logger,
}

/// Drives one accepted control connection end to end: sends the greeting,
/// then alternates between reading the next command and draining replies
/// until `QUIT` or the peer disconnects.
pub(crate) async fn run_session<M, B, C>(stream: TcpStream, ctx: Arc<SessionContext<M, B, C>>, greeting: String)
where
    M: MetadataStore + 'static,
    B: BlobBackend + 'static,
    C: CredentialStore + 'static,
{
    let mut framed = Framed::new(stream, FtpCodec::new());

    if framed.send(Reply::single(ReplyCode::ServiceReady, greeting)).await.is_err() {
        return;
    }

    let (tx, mut rx) = mpsc::channel::<Reply>(16);

    loop {
        tokio::select! {
            biased;

            reply = rx.recv() => {
                match reply {
                    Some(reply) => {
                        if framed.send(reply).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            line = framed.next() => {
                let Some(decoded) = line else { break };
                let (cmd, rest) = match decoded {
                    Ok(pair) => pair,
                    Err(e) => {
                        slog::warn!(ctx.logger, "control channel read error"; "error" => %e);
                        break;
                    }
                };

                if cmd == "quit" {
                    ctx.conn.abort_transfer().await;
                    let _ = framed.send(Reply::single(ReplyCode::ClosingControlConnection, "goodbye")).await;
                    break;
                }

                // REST applies to exactly one following STOR/APPE/RETR; every
                // other command resets it (§4.9).
                if !matches!(cmd.as_str(), "retr" | "stor" | "appe") {
                    let _ = ctx.conn.take_restart_offset().await;
                }

                dispatch(&cmd, &rest, Arc::clone(&ctx), tx.clone()).await;
            }
        }
    }

    // Release whatever this session held regardless of how it ended — a
    // graceful QUIT above, a peer close, or a control-channel read error
    // all reach here exactly once (§4.9).
    ctx.conn.abort_transfer().await;
    if let Some(login) = ctx.conn.take_login_for_quota_release().await {
        ctx.auth.notify_logout(&login);
    }
}
