//! The passive data-channel broker (component J): binds an ephemeral
//! listener from the configured port range for a `PASV`/`EPSV` command,
//! and hands the first accepted connection back to the session that asked
//! for it.
//!
//! Grounded on the original `Switchboard`'s `DashMap<SwitchboardKey, _>`
//! keyed-by-source-IP claim discipline and its randomized-start linear
//! scan over the port range; simplified to a single plain-TCP listener per
//! reservation instead of a registry of long-lived sessions, since this
//! crate has no active-mode/TLS data channel to multiplex.

use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::{Error, ErrorKind};
use crate::server::session::Connection;

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
struct SwitchboardKey {
    source: IpAddr,
    port: u16,
}

/// Reserves passive listening ports out of a configured range, one per
/// client source address at a time, and forwards the first accepted
/// connection on each to the `Connection` that reserved it.
#[derive(Debug)]
pub struct Switchboard {
    claimed: Arc<DashMap<SwitchboardKey, ()>>,
    port_range: RangeInclusive<u16>,
    logger: slog::Logger,
}

impl Switchboard {
    /// Builds a broker over `passive_ports`.
    pub fn new(logger: slog::Logger, passive_ports: RangeInclusive<u16>) -> Switchboard {
        Switchboard { claimed: Arc::new(DashMap::new()), port_range: passive_ports, logger }
    }

    /// Binds the next free port in the configured range for `source`,
    /// spawns a task that accepts exactly one connection on it and hands
    /// the socket to `connection`, and returns the address the client
    /// should be told to connect to.
    ///
    /// Fails with [`ErrorKind::NoAvailablePort`] if every port in the
    /// range is already claimed by this source address.
    pub async fn reserve(&self, source: IpAddr, advertise_ip: IpAddr, connection: Arc<Connection>) -> Result<SocketAddr, Error> {
        // u32 so a full `0..=65535` configuration (size 65536) doesn't
        // overflow u16 and divide-by-zero on the modulo below.
        let range_size: u32 = *self.port_range.end() as u32 - *self.port_range.start() as u32 + 1;
        let mut rand_bytes = [0u8; 4];
        getrandom::fill(&mut rand_bytes).map_err(|e| Error::new(ErrorKind::IoFailure, std::io::Error::other(e)))?;
        let start_offset = u32::from_ne_bytes(rand_bytes) % range_size;

        for i in 0..range_size {
            let port = (*self.port_range.start() as u32 + ((start_offset + i) % range_size)) as u16;
            let key = SwitchboardKey { source, port };
            if self.claimed.insert(key.clone(), ()).is_some() {
                // Already claimed by this source; try the next port.
                continue;
            }
            let bind_addr = SocketAddr::new(if advertise_ip.is_loopback() { advertise_ip } else { "0.0.0.0".parse().unwrap() }, port);
            match TcpListener::bind(bind_addr).await {
                Ok(listener) => {
                    let advertised = SocketAddr::new(advertise_ip, port);
                    self.spawn_accept(listener, key, connection);
                    return Ok(advertised);
                }
                Err(e) => {
                    slog::debug!(self.logger, "passive port unavailable, trying next"; "port" => port, "error" => %e);
                    self.claimed.remove(&key);
                    continue;
                }
            }
        }
        slog::warn!(self.logger, "exhausted passive port range"; "source" => %source);
        Err(ErrorKind::NoAvailablePort.into())
    }

    fn spawn_accept(&self, listener: TcpListener, key: SwitchboardKey, connection: Arc<Connection>) {
        let claimed = Arc::clone(&self.claimed);
        let logger = self.logger.clone();
        tokio::spawn(async move {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    slog::debug!(logger, "passive data connection accepted"; "peer" => %peer);
                    connection.fulfill_data_connection(stream).await;
                }
                Err(e) => {
                    slog::warn!(logger, "passive accept failed"; "error" => %e);
                }
            }
            claimed.remove(&key);
        });
    }
}
