//! The command table (component I): one async function per verb, each the
//! composition of its precondition gates (§4.8), the VFS/auth action, and
//! exactly one reply (or, for transfer commands, a `150` followed later by
//! a `226`/`426`/`451` sent from a background task).

use crate::auth::{CredentialStore, GetUserOutcome};
use crate::error::{Error, ErrorKind};
use crate::meta::MetadataStore;
use crate::metrics;
use crate::server::controlchan::control_loop::SessionContext;
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::upload::blob::BlobBackend;
use crate::vfs::{NodeType, OpenMode};
use crate::{path, vfs};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tokio::sync::Notify;

/// Verbs whose transfer body runs as a background task so that the control
/// channel can keep accepting commands while it streams (§4.9).
pub(crate) fn is_transfer_command(cmd: &str) -> bool {
    matches!(cmd, "stor" | "appe" | "retr" | "list" | "mlsd")
}

/// Turns an [`Error`] into the one reply code its kind maps to (§7, P9).
fn reply_for_error(e: &Error) -> Reply {
    let message = match e.kind() {
        ErrorKind::NotFound => "no such file or directory",
        ErrorKind::Exists => "file already exists",
        ErrorKind::NotADir => "not a directory",
        ErrorKind::NotAFile => "not a file",
        ErrorKind::PermissionDenied => "permission denied",
        ErrorKind::BadSequence => "bad sequence of commands",
        ErrorKind::DataChannelMissing => "data connection not established",
        ErrorKind::TransferAborted => "transfer aborted",
        ErrorKind::IoFailure => "local error in processing",
        ErrorKind::NoAvailablePort => "no available port",
        ErrorKind::Busy => "too many connections",
        ErrorKind::AuthFailure => "authentication failed",
        ErrorKind::QuotaExceeded => "user connection quota exceeded",
    };
    let code = match e.kind() {
        ErrorKind::NotFound | ErrorKind::Exists | ErrorKind::NotADir | ErrorKind::NotAFile | ErrorKind::PermissionDenied => ReplyCode::FileError,
        ErrorKind::BadSequence => ReplyCode::BadCommandSequence,
        ErrorKind::DataChannelMissing => ReplyCode::CantOpenDataConnection,
        ErrorKind::TransferAborted => ReplyCode::ConnectionClosed,
        ErrorKind::IoFailure => ReplyCode::LocalError,
        ErrorKind::NoAvailablePort | ErrorKind::Busy | ErrorKind::QuotaExceeded => ReplyCode::ServiceNotAvailable,
        ErrorKind::AuthFailure => ReplyCode::NotLoggedIn,
    };
    Reply::single(code, message)
}

/// Dispatches one parsed `(cmd, rest)` pair. Immediate commands send their
/// single reply directly; transfer commands spawn a background task that
/// sends its final reply once the data channel has been drained.
pub(crate) async fn dispatch<M, B, C>(cmd: &str, rest: &str, ctx: Arc<SessionContext<M, B, C>>, tx: Sender<Reply>)
where
    M: MetadataStore + 'static,
    B: BlobBackend + 'static,
    C: CredentialStore + 'static,
{
    if is_transfer_command(cmd) {
        spawn_transfer(cmd.to_string(), rest.to_string(), ctx, tx).await;
        return;
    }

    if cmd == "abor" {
        let _ = tx.send(cmd_abor(&ctx).await).await;
        return;
    }

    let reply = match cmd {
        "user" => cmd_user(rest, &ctx).await,
        "pass" => cmd_pass(rest, &ctx).await,
        "pwd" => cmd_pwd(&ctx).await,
        "cwd" => cmd_cwd(rest, &ctx).await,
        "cdup" => cmd_cwd("..", &ctx).await,
        "mkd" => cmd_mkd(rest, &ctx).await,
        "rmd" => cmd_rmd(rest, &ctx).await,
        "dele" => cmd_dele(rest, &ctx).await,
        "rnfr" => cmd_rnfr(rest, &ctx).await,
        "rnto" => cmd_rnto(rest, &ctx).await,
        "rest" => cmd_rest(rest, &ctx).await,
        "type" => Reply::single(ReplyCode::CommandOkay, "type set to I"),
        "pbsz" => Reply::single(ReplyCode::CommandOkay, "pbsz ok"),
        "prot" => Reply::single(ReplyCode::CommandOkay, "prot ok"),
        "syst" => Reply::single(ReplyCode::SystemType, "UNIX Type: L8"),
        "feat" => cmd_feat(),
        "opts" => Reply::single(ReplyCode::CommandOkay, "ok"),
        "size" => cmd_size(rest, &ctx).await,
        "mdtm" => cmd_mdtm(rest, &ctx).await,
        "mlst" => cmd_mlst(rest, &ctx).await,
        "pasv" => cmd_pasv(&ctx).await,
        "epsv" => cmd_epsv(&ctx).await,
        _ => Reply::single(ReplyCode::CommandNotImplemented, "command not implemented"),
    };
    let _ = tx.send(reply).await;
}

async fn cmd_user<M: MetadataStore, B: BlobBackend, C: CredentialStore>(login: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    if login.is_empty() {
        return Reply::single(ReplyCode::ParameterSyntaxError, "a login name is required");
    }
    match ctx.auth.get_user(login).await {
        Ok(GetUserOutcome::PasswordRequired(pending)) => {
            ctx.conn.set_user(login, pending).await;
            Reply::single(ReplyCode::NeedPassword, format!("password required for {login}"))
        }
        Ok(GetUserOutcome::Error(msg)) => Reply::single(ReplyCode::NotLoggedIn, msg),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_pass<M: MetadataStore, B: BlobBackend, C: CredentialStore>(password: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let pending = match ctx.conn.take_pending_login().await {
        Ok(p) => p,
        Err(e) => return reply_for_error(&e),
    };
    if pending.authenticate(password) {
        metrics::record_login(true);
        slog::info!(ctx.logger, "login succeeded"; "user" => %pending.user.login);
        ctx.conn.set_logged_in(pending.user).await;
        Reply::single(ReplyCode::UserLoggedIn, "login successful")
    } else {
        metrics::record_login(false);
        if let Some(login) = ctx.conn.take_login_for_quota_release().await {
            ctx.auth.notify_logout(&login);
        }
        Reply::single(ReplyCode::NotLoggedIn, "login incorrect")
    }
}

async fn cmd_pwd<M: MetadataStore, B: BlobBackend, C: CredentialStore>(ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    let cwd = ctx.conn.cwd().await;
    Reply::single(ReplyCode::DirCreated, format!("\"{cwd}\" is the current directory"))
}

async fn cmd_cwd<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    match ctx.vfs.get_node(&target).await {
        Ok(Some(node)) if node.node_type == NodeType::Dir => {
            ctx.conn.set_cwd(&target).await;
            Reply::single(ReplyCode::FileActionOkay, "directory changed")
        }
        Ok(Some(_)) => reply_for_error(&ErrorKind::NotADir.into()),
        Ok(None) if target == "/" => {
            ctx.conn.set_cwd(&target).await;
            Reply::single(ReplyCode::FileActionOkay, "directory changed")
        }
        Ok(None) => reply_for_error(&ErrorKind::NotFound.into()),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_mkd<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&target).writable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.mkdir(&target, false).await {
        Ok(()) => Reply::single(ReplyCode::DirCreated, format!("\"{target}\" created")),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_rmd<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&target).writable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.rmdir(&target).await {
        Ok(()) => Reply::single(ReplyCode::FileActionOkay, "directory removed"),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_dele<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&target).writable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.unlink(&target).await {
        Ok(()) => Reply::single(ReplyCode::FileActionOkay, "file removed"),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_rnfr<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    match ctx.vfs.get_node(&target).await {
        Ok(Some(_)) => {
            ctx.conn.set_rename_from(&target).await;
            Reply::single(ReplyCode::FileActionPending, "ready for RNTO")
        }
        Ok(None) => reply_for_error(&ErrorKind::NotFound.into()),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_rnto<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let src = match ctx.conn.take_rename_from().await {
        Ok(s) => s,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let dst = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&src).writable || !identity.get_permissions(&dst).writable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.rename(&src, &dst).await {
        Ok(()) => Reply::single(ReplyCode::FileActionOkay, "renamed"),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_rest<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    match rest.trim().parse::<u64>() {
        Ok(offset) => {
            ctx.conn.set_restart_offset(offset).await;
            Reply::single(ReplyCode::FileActionPending, format!("restarting at {offset}"))
        }
        Err(_) => Reply::single(ReplyCode::ParameterSyntaxError, "invalid restart offset"),
    }
}

fn cmd_feat() -> Reply {
    Reply::multi(
        ReplyCode::CommandOkay,
        vec![
            "Features:".to_string(),
            "UTF8".to_string(),
            "SIZE".to_string(),
            "MDTM".to_string(),
            "MLST type*;size*;modify*;perm*;unique*;unix.mode*;".to_string(),
            "EPSV".to_string(),
            "PASV".to_string(),
            "End".to_string(),
        ],
    )
}

async fn cmd_size<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&target).readable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.stat(&target).await {
        Ok(Some(node)) if node.node_type == NodeType::File => Reply::single(ReplyCode::FileStatus, node.size.to_string()),
        Ok(Some(_)) => reply_for_error(&ErrorKind::NotAFile.into()),
        Ok(None) => reply_for_error(&ErrorKind::NotFound.into()),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_mdtm<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = path::resolve_virtual(&cwd, rest);
    if !identity.get_permissions(&target).readable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.stat(&target).await {
        Ok(Some(node)) => Reply::single(ReplyCode::FileStatus, format_mdtm(node.mtime)),
        Ok(None) => reply_for_error(&ErrorKind::NotFound.into()),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_mlst<M: MetadataStore, B: BlobBackend, C: CredentialStore>(rest: &str, ctx: &SessionContext<M, B, C>) -> Reply {
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => return reply_for_error(&e),
    };
    let cwd = ctx.conn.cwd().await;
    let target = if rest.is_empty() { cwd.clone() } else { path::resolve_virtual(&cwd, rest) };
    if !identity.get_permissions(&target).readable {
        return reply_for_error(&ErrorKind::PermissionDenied.into());
    }
    match ctx.vfs.stat(&target).await {
        Ok(Some(node)) => Reply::multi(ReplyCode::FileStatus, vec!["Listing:".to_string(), mlst_fact_line(&node, &target), "End".to_string()]),
        Ok(None) if target == "/" => Reply::multi(ReplyCode::FileStatus, vec!["Listing:".to_string(), "type=dir; /".to_string(), "End".to_string()]),
        Ok(None) => reply_for_error(&ErrorKind::NotFound.into()),
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_pasv<M: MetadataStore, B: BlobBackend, C: CredentialStore>(ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    match open_passive(ctx).await {
        Ok(addr) => {
            let ip = match addr.ip() {
                IpAddr::V4(v4) => v4.octets(),
                IpAddr::V6(_) => [0, 0, 0, 0],
            };
            let port = addr.port();
            Reply::single(
                ReplyCode::EnteringPassiveMode,
                format!("entering passive mode ({},{},{},{},{},{})", ip[0], ip[1], ip[2], ip[3], port >> 8, port & 0xff),
            )
        }
        Err(e) => reply_for_error(&e),
    }
}

async fn cmd_epsv<M: MetadataStore, B: BlobBackend, C: CredentialStore>(ctx: &SessionContext<M, B, C>) -> Reply {
    if let Err(e) = ctx.conn.require_login().await {
        return reply_for_error(&e);
    }
    match open_passive(ctx).await {
        Ok(addr) => Reply::single(ReplyCode::EnteringExtendedPassiveMode, format!("entering extended passive mode (|||{}|)", addr.port())),
        Err(e) => reply_for_error(&e),
    }
}

async fn open_passive<M: MetadataStore, B: BlobBackend, C: CredentialStore>(ctx: &SessionContext<M, B, C>) -> Result<SocketAddr, Error> {
    let source = ctx.conn.peer_addr().ip();
    let advertise = ctx.masquerade_addr.unwrap_or(ctx.server_host);
    let addr = ctx.switchboard.reserve(source, advertise, Arc::clone(&ctx.conn)).await?;
    ctx.conn.set_passive_addr(addr).await;
    Ok(addr)
}

/// A cancelled transfer task emits its own `426`/`226` pair on `tx`; `ABOR`
/// only replies directly when there was nothing in flight to cancel.
async fn cmd_abor<M: MetadataStore, B: BlobBackend, C: CredentialStore>(ctx: &SessionContext<M, B, C>) -> Reply {
    if ctx.conn.abort_transfer().await {
        Reply::None
    } else {
        Reply::single(ReplyCode::ClosingDataConnection, "no transfer in progress")
    }
}

/// Spawns the background task driving `STOR`/`APPE`/`RETR`/`LIST`/`MLSD`:
/// runs the gates and opens the data connection inline (so a failure can
/// reply immediately), then hands the actual streaming off to a task whose
/// final reply arrives on `tx` once it completes, satisfying "a handler may
/// complete after subsequent control commands are read" (§4.9, §5).
async fn spawn_transfer<M, B, C>(cmd: String, rest: String, ctx: Arc<SessionContext<M, B, C>>, tx: Sender<Reply>)
where
    M: MetadataStore + 'static,
    B: BlobBackend + 'static,
    C: CredentialStore + 'static,
{
    let identity = match ctx.conn.require_login().await {
        Ok(id) => id,
        Err(e) => {
            let _ = tx.send(reply_for_error(&e)).await;
            return;
        }
    };
    let cwd = ctx.conn.cwd().await;
    let target = if cmd == "list" || cmd == "mlsd" {
        if rest.is_empty() {
            cwd.clone()
        } else {
            path::resolve_virtual(&cwd, &rest)
        }
    } else {
        path::resolve_virtual(&cwd, &rest)
    };

    let permission_ok = match cmd.as_str() {
        "retr" | "list" | "mlsd" => identity.get_permissions(&target).readable,
        "stor" | "appe" => identity.get_permissions(&target).writable,
        _ => false,
    };
    if !permission_ok {
        let _ = tx.send(reply_for_error(&ErrorKind::PermissionDenied.into())).await;
        return;
    }

    if let Err(e) = ctx.conn.require_passive_addr().await {
        let _ = tx.send(reply_for_error(&e)).await;
        return;
    }

    let data_stream = match ctx.conn.take_data_connection().await {
        Ok(s) => s,
        Err(e) => {
            let _ = tx.send(reply_for_error(&e)).await;
            return;
        }
    };

    let restart_offset = if cmd == "retr" || cmd == "stor" || cmd == "appe" { ctx.conn.take_restart_offset().await } else { 0 };

    let preliminary = match cmd.as_str() {
        "retr" => "download starting",
        "list" | "mlsd" => "listing",
        _ => "about to start data transfer",
    };
    let _ = tx.send(Reply::single(ReplyCode::FileStatusOkay, preliminary)).await;

    let conn = Arc::clone(&ctx.conn);
    let vfs = Arc::clone(&ctx.vfs);
    let logger = ctx.logger.clone();
    let cancel = Arc::new(Notify::new());
    let task_cancel = Arc::clone(&cancel);
    tokio::spawn(async move {
        let transfer = run_transfer(&cmd, &target, restart_offset, data_stream, vfs, &logger);
        tokio::pin!(transfer);
        let final_reply = tokio::select! {
            biased;
            _ = task_cancel.notified() => {
                let _ = tx.send(reply_for_error(&ErrorKind::TransferAborted.into())).await;
                Reply::single(ReplyCode::ClosingDataConnection, "abort successful")
            }
            reply = &mut transfer => reply,
        };
        conn.clear_transfer_task().await;
        let _ = tx.send(final_reply).await;
    });
    ctx.conn.set_transfer_task(cancel).await;
}

async fn run_transfer<M: MetadataStore, B: BlobBackend>(
    cmd: &str,
    target: &str,
    restart_offset: u64,
    mut data_stream: tokio::net::TcpStream,
    vfs: Arc<vfs::Vfs<M, B>>,
    logger: &slog::Logger,
) -> Reply {
    let result: Result<(), Error> = async {
        match cmd {
            "stor" | "appe" => {
                let mut handle = vfs.open(target, OpenMode::Write).await?;
                handle.seek(restart_offset);
                handle.write_stream(&mut data_stream).await?;
                Ok(())
            }
            "retr" => {
                let mut handle = vfs.open(target, OpenMode::Read).await?;
                handle.seek(restart_offset);
                loop {
                    match handle.read_block(1024 * 1024).await? {
                        Some(block) => data_stream.write_all(&block).await.map_err(Error::from)?,
                        None => break,
                    }
                }
                Ok(())
            }
            "list" => {
                let entries = vfs.list(target).await?;
                let body = format_list(&entries);
                data_stream.write_all(body.as_bytes()).await.map_err(Error::from)?;
                Ok(())
            }
            "mlsd" => {
                let entries = vfs.list(target).await?;
                let body = format_mlsd(&entries);
                data_stream.write_all(body.as_bytes()).await.map_err(Error::from)?;
                Ok(())
            }
            _ => unreachable!("not a transfer command"),
        }
    }
    .await;

    let _ = data_stream.shutdown().await;

    match result {
        Ok(()) => {
            let message = if cmd == "list" || cmd == "mlsd" { "done" } else { "transfer complete" };
            Reply::single(ReplyCode::ClosingDataConnection, message)
        }
        Err(e) if e.kind() == ErrorKind::IoFailure => {
            slog::warn!(logger, "transfer failed"; "command" => cmd, "path" => target, "error" => %e);
            reply_for_error(&e)
        }
        Err(e) => reply_for_error(&e),
    }
}

fn format_mdtm(mtime_secs: i64) -> String {
    chrono::DateTime::from_timestamp(mtime_secs, 0).map(|dt| dt.format("%Y%m%d%H%M%S").to_string()).unwrap_or_else(|| "00000000000000".to_string())
}

fn format_mode_string(node: &crate::vfs::Node) -> String {
    match node.node_type {
        NodeType::Dir => "drwxrwxrwx".to_string(),
        NodeType::File => "-rw-rw-rw-".to_string(),
    }
}

/// `LIST`'s `ls -l` style line for one entry, following POSIX rules for
/// whether the timestamp shows a clock time (within the last ~6 months) or
/// the year.
fn format_list_line(node: &crate::vfs::Node) -> String {
    let mode = format_mode_string(node);
    let size = node.size;
    let stamp = format_ls_timestamp(node.mtime);
    format!("{mode} 1 ftp ftp {size:>10} {stamp} {name}", name = node.name)
}

fn format_ls_timestamp(mtime_secs: i64) -> String {
    let Some(dt) = chrono::DateTime::from_timestamp(mtime_secs, 0) else {
        return "Jan  1  1970".to_string();
    };
    let now = chrono::DateTime::from_timestamp(crate::vfs::node::now_secs(), 0).unwrap_or(dt);
    let six_months = chrono::Duration::days(183);
    if now.signed_duration_since(dt) < six_months && dt <= now {
        dt.format("%b %e %H:%M").to_string()
    } else {
        dt.format("%b %e  %Y").to_string()
    }
}

fn format_list(entries: &[crate::vfs::Node]) -> String {
    let mut out = String::new();
    for node in entries {
        out.push_str(&format_list_line(node));
        out.push_str("\r\n");
    }
    out
}

fn mlst_fact_line(node: &crate::vfs::Node, path_str: &str) -> String {
    let type_fact = match node.node_type {
        NodeType::Dir => "dir",
        NodeType::File => "file",
    };
    format!(
        "type={type_fact};size={size};modify={modify};unix.mode={mode:o}; {name}",
        size = node.size,
        modify = format_mdtm(node.mtime),
        mode = node.mode_bits(),
        name = path_str
    )
}

fn format_mlsd(entries: &[crate::vfs::Node]) -> String {
    let mut out = String::new();
    for node in entries {
        out.push_str(&mlst_fact_line(node, &node.name));
        out.push_str("\r\n");
    }
    out
}
