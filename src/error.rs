//! The crate-wide error type and its mapping onto FTP reply codes.
//!
//! Every fallible boundary in this crate — the VFS, the metadata store, the
//! blob backend, the credential store — returns [`Error`] or a narrower
//! error that converts into it. The control-channel dispatcher is the only
//! place that turns an [`ErrorKind`] into a numeric reply code; no other
//! component computes one.

use derive_more::Display;
use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error produced by any collaborator in this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new error of the given kind, wrapping an underlying cause.
    pub fn new<E>(kind: ErrorKind, source: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: Some(source.into()),
        }
    }

    /// The FTP-significant discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind, source: None }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        let kind = match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => ErrorKind::Exists,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailure,
        };
        Error::new(kind, e)
    }
}

/// The FTP-significant kind of an [`Error`], each mapped to exactly one
/// reply code at the control-channel boundary (see `server::reply`).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ErrorKind {
    /// 550 - no node at the resolved path.
    #[display("550 no such file or directory")]
    NotFound,
    /// 550 - a node already exists where one must not.
    #[display("550 file already exists")]
    Exists,
    /// 550 - the resolved path is a file where a directory was required.
    #[display("550 not a directory")]
    NotADir,
    /// 550 - the resolved path is a directory where a file was required.
    #[display("550 not a file")]
    NotAFile,
    /// 550 - the user's permissions forbid the operation.
    #[display("550 permission denied")]
    PermissionDenied,
    /// 503 - a command precondition (required prior command / slot) was not met.
    #[display("503 bad sequence of commands")]
    BadSequence,
    /// 425 - a data-channel operation was attempted before the data connection was made.
    #[display("425 data connection not established")]
    DataChannelMissing,
    /// 426 then 226 - a transfer was cancelled by ABOR.
    #[display("426 transfer aborted")]
    TransferAborted,
    /// 451 - an I/O failure at the VFS, metadata store, or blob backend.
    #[display("451 local error in processing")]
    IoFailure,
    /// 421 - the passive port range is exhausted.
    #[display("421 no available port")]
    NoAvailablePort,
    /// 421 - the server-wide connection cap has been reached.
    #[display("421 too many connections")]
    Busy,
    /// 530 - authentication failed.
    #[display("530 authentication failed")]
    AuthFailure,
    /// 421 - the user's own connection quota has been reached.
    #[display("421 user connection quota exceeded")]
    QuotaExceeded,
}

/// Convenient alias for fallible results returned by this crate's collaborators.
pub type Result<T> = std::result::Result<T, Error>;
