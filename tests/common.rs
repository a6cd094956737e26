#![allow(missing_docs, dead_code)]

use async_trait::async_trait;
use blob_store_memory::MemoryBlobBackend;
use chunkftp::auth::{CredentialStore, Permission, StoredUser};
use chunkftp::{Server, ServerBuilder};
use meta_store_memory::MemoryMetadataStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

/// A fixed two-user credential store: `alice`/`secret` with a full home
/// directory, `reader`/`secret` with an explicit read-only `/` permission.
/// `UserDetail::new` still grants `reader` an unconditional write under its
/// own home `/reader`; the P7 assertions target paths under `/` instead, to
/// exercise the explicit read-only grant rather than the home directory.
#[derive(Debug)]
pub struct FixedCredentialStore;

#[async_trait]
impl CredentialStore for FixedCredentialStore {
    async fn find_user_by_login(&self, login: &str) -> std::io::Result<Option<StoredUser>> {
        Ok(match login {
            "alice" => Some(StoredUser { login: "alice".to_string(), password: "secret".to_string(), home_path: None, permissions: vec![] }),
            "reader" => Some(StoredUser {
                login: "reader".to_string(),
                home_path: Some("/reader".to_string()),
                password: "secret".to_string(),
                permissions: vec![Permission { path: "/".to_string(), readable: true, writable: false }],
            }),
            _ => None,
        })
    }
}

/// Builds a server on the in-memory reference backends, bound to an
/// OS-assigned port, and returns that address once the listener is ready
/// to accept connections.
pub async fn spawn_server(chunk_size: u64, connection_cap: usize) -> SocketAddr {
    spawn_server_with_handles(chunk_size, connection_cap).await.0
}

/// Same as [`spawn_server`], but also returns the in-memory store and blob
/// backend handles so a test can inspect what the upload pipeline actually
/// wrote once it settles.
pub async fn spawn_server_with_handles(chunk_size: u64, connection_cap: usize) -> (SocketAddr, Arc<MemoryMetadataStore>, Arc<MemoryBlobBackend>) {
    let store = Arc::new(MemoryMetadataStore::new());
    let blob = Arc::new(MemoryBlobBackend::new());
    let credentials = Arc::new(FixedCredentialStore);
    let staging_dir = tempfile::tempdir().unwrap().keep();

    let server: Server<_, _, _> = ServerBuilder::new(Arc::clone(&store), Arc::clone(&blob), credentials, staging_dir, "primary")
        .chunk_size(chunk_size)
        .connection_cap(connection_cap)
        .build()
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    tokio::spawn(async move {
        let _ = server.listen(addr).await;
    });

    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    (addr, store, blob)
}

/// A line-oriented client over the control channel: every call sends one
/// command and reads back exactly one reply (single- or multi-line).
pub struct Client {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = Client { stream, buf: Vec::new() };
        client.read_reply().await;
        client
    }

    pub async fn send(&mut self, line: &str) -> String {
        self.stream.writable().await.unwrap();
        self.stream.try_write(format!("{line}\r\n").as_bytes()).unwrap();
        self.read_reply().await
    }

    /// Reads the next reply off the wire without sending a command first —
    /// for a transfer's final `226`/`426`/`451`, which arrives asynchronously
    /// on the control channel once its background task finishes.
    pub async fn recv_reply(&mut self) -> String {
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> String {
        loop {
            if let Some(reply) = self.take_complete_reply() {
                return reply;
            }
            self.stream.readable().await.unwrap();
            let mut chunk = [0u8; 4096];
            match self.stream.try_read(&mut chunk) {
                Ok(0) => panic!("server closed connection mid-reply"),
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => panic!("{e}"),
            }
        }
    }

    /// A reply is complete once its last line's code is followed by a
    /// space rather than a `-` continuation marker (§4.9's multi-line
    /// convention).
    fn take_complete_reply(&mut self) -> Option<String> {
        let text = std::str::from_utf8(&self.buf).ok()?;
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
        let last = lines.last()?;
        if last.len() >= 4 && last.as_bytes()[3] == b' ' {
            let reply = lines.join("\r\n");
            self.buf.clear();
            Some(reply)
        } else {
            None
        }
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }
}

/// Parses the host/port pair out of a `227 entering passive mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn parse_pasv_addr(reply: &str) -> SocketAddr {
    let start = reply.find('(').unwrap() + 1;
    let end = reply.find(')').unwrap();
    let parts: Vec<u16> = reply[start..end].split(',').map(|p| p.parse().unwrap()).collect();
    let ip = format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3]);
    let port = (parts[4] << 8) | parts[5];
    format!("{ip}:{port}").parse().unwrap()
}

pub async fn read_all(stream: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        stream.readable().await.unwrap();
        match stream.try_read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => panic!("{e}"),
        }
    }
    out
}

pub async fn write_all(stream: &mut TcpStream, data: &[u8]) {
    let mut written = 0;
    while written < data.len() {
        stream.writable().await.unwrap();
        match stream.try_write(&data[written..]) {
            Ok(n) => written += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => panic!("{e}"),
        }
    }
}
