//! Runs a `chunkftp` server on the in-memory reference metadata store and
//! blob backend, with users read from a `credentials.json` file next to
//! the binary — no real document store or blob store required to try it.

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
        .greeting("Welcome to chunkftp")
        .build()?;

    let addr = "127.0.0.1:2121".parse()?;
    println!("Starting ftp server on {addr}");
    server.listen(addr).await?;

    Ok(())
}
