//! Runs a `chunkftp` server behind NAT, tuned for a small fleet: a narrower
//! passive port range, a masquerade address for `PASV`/`EPSV` replies, a
//! best-effort backup blob target, and credentials from a JSON file.

use blob_store_memory::MemoryBlobBackend;
use chunkftp::ServerBuilder;
use meta_store_memory::MemoryMetadataStore;
use std::sync::Arc;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryMetadataStore::new());
    let blob = Arc::new(MemoryBlobBackend::new());
    let credentials = Arc::new(auth_jsonfile::JsonFileCredentialStore::new("credentials.json"));

    let server = ServerBuilder::new(store, blob, credentials, std::env::temp_dir(), "primary")
        .masquerade_addr("203.0.113.10".parse()?)
        .passive_ports(50000..=50100)
        .backup_target("secondary")
        .worker_count(8)
        .connection_cap(64)
        .build()?;

    let addr = "0.0.0.0:2121".parse()?;
    println!("Starting ftp server on {addr}");
    server.listen(addr).await?;

    Ok(())
}
