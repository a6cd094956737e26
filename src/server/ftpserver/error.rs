//! Contains the error type returned by [`Server::listen`](crate::Server::listen).

use crate::BoxError;
use std::net::AddrParseError;
use thiserror::Error;

/// Error returned while building or running a [`Server`](crate::Server).
#[derive(Error, Debug)]
#[error("server error: {msg}")]
pub struct ServerError {
    msg: String,
    #[source]
    source: Option<BoxError>,
}

impl ServerError {
    pub(crate) fn new<E: std::error::Error + Send + Sync + 'static>(msg: impl Into<String>, source: E) -> ServerError {
        ServerError { msg: msg.into(), source: Some(Box::new(source)) }
    }

    /// An error with no underlying cause, used for builder validation failures (P10).
    pub(crate) fn validation(msg: impl Into<String>) -> ServerError {
        ServerError { msg: msg.into(), source: None }
    }
}

impl From<AddrParseError> for ServerError {
    fn from(e: AddrParseError) -> Self {
        ServerError::new("could not parse address", e)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::new("io error", e)
    }
}
