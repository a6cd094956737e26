mod common;

use chunkftp::meta::MetadataStore;
use chunkftp::vfs::FileStatus;
use common::{spawn_server_with_handles, Client};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

async fn login(client: &mut Client) {
    assert_eq!(client.send("USER alice").await, "331 password required for alice");
    assert_eq!(client.send("PASS secret").await, "230 login successful");
}

async fn open_pasv_data(client: &mut Client) -> TcpStream {
    let pasv = client.send("PASV").await;
    assert!(pasv.starts_with("227 "), "got {pasv}");
    let addr = common::parse_pasv_addr(&pasv);
    TcpStream::connect(addr).await.unwrap()
}

/// Scenario 2 / P3: uploading through a `.partial` name and renaming it to
/// its final name enqueues exactly one upload task, and the worker
/// eventually persists it as chunks summing to the original size (P4).
#[tokio::test]
async fn partial_rename_triggers_upload_and_completes() {
    let chunk_size = 2 * 1024 * 1024;
    let (addr, store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let payload = vec![0xABu8; 5 * 1024 * 1024];
    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR bigfile.bin.partial").await, "150 about to start data transfer");
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();
    assert_eq!(client.recv_reply().await, "226 transfer complete");
    assert_eq!(client.send("RNFR bigfile.bin.partial").await, "350 ready for RNTO");
    assert_eq!(client.send("RNTO bigfile.bin").await, "250 renamed");

    let size_reply = client.send("SIZE bigfile.bin").await;
    assert_eq!(size_reply, format!("213 {}", payload.len()));

    let node = wait_for_completed(&store, "/alice", "bigfile.bin").await;
    assert_eq!(node.status(), FileStatus::Completed);
    assert!(node.local_path.is_none());
    assert_eq!(node.parts.len(), 3);
    let total: u64 = node.parts.iter().map(|p| p.size as u64).sum();
    assert_eq!(total, node.size);
    for (i, part) in node.parts.iter().enumerate() {
        assert_eq!(part.part_id as usize, i);
    }
}

/// A direct (non-`.partial`) `STOR` also enqueues exactly one upload task.
#[tokio::test]
async fn direct_stor_of_non_partial_name_enqueues_upload() {
    let chunk_size = 4 * 1024 * 1024;
    let (addr, store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let payload = vec![0x11u8; 1024];
    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR report.csv").await, "150 about to start data transfer");
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();
    assert_eq!(client.recv_reply().await, "226 transfer complete");

    let node = wait_for_completed(&store, "/alice", "report.csv").await;
    assert_eq!(node.size, payload.len() as u64);
    assert_eq!(node.parts.len(), 1);
}

/// Scenario 3 / P5: `REST` offsets a subsequent `RETR` to resume a
/// download partway through.
#[tokio::test]
async fn rest_resumes_retr_at_the_requested_offset() {
    let chunk_size = 10 * 1024 * 1024;
    let (addr, _store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let payload: Vec<u8> = (0..(10 * 1024usize)).map(|i| (i % 256) as u8).collect();
    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR x").await, "150 about to start data transfer");
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();
    assert_eq!(client.recv_reply().await, "226 transfer complete");

    let offset = 4096usize;
    assert_eq!(client.send(&format!("REST {offset}")).await, format!("350 restarting at {offset}"));
    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("RETR x").await, "150 download starting");
    let received = common::read_all(&mut data).await;
    assert_eq!(client.recv_reply().await, "226 transfer complete");
    assert_eq!(received, payload[offset..]);
}

/// `.partial` names are never auto-enqueued by a direct `STOR`, only by the
/// rename that drops the suffix (I5).
#[tokio::test]
async fn stor_of_partial_name_does_not_enqueue() {
    let chunk_size = 4 * 1024 * 1024;
    let (addr, store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR leftover.bin.partial").await, "150 about to start data transfer");
    data.write_all(b"partial bytes").await.unwrap();
    data.shutdown().await.unwrap();
    assert_eq!(client.recv_reply().await, "226 transfer complete");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let node = store.find_one("/alice", "leftover.bin.partial").await.unwrap().unwrap();
    assert_eq!(node.status(), FileStatus::Staging);
    assert!(node.local_path.is_some());
}

/// P2: a `.partial` file is never surfaced by `LIST`.
#[tokio::test]
async fn list_filters_out_partial_names() {
    let chunk_size = 4 * 1024 * 1024;
    let (addr, _store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR hidden.bin.partial").await, "150 about to start data transfer");
    data.write_all(b"xyz").await.unwrap();
    data.shutdown().await.unwrap();
    assert_eq!(client.recv_reply().await, "226 transfer complete");

    let mut data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("LIST").await, "150 listing");
    let body = common::read_all(&mut data).await;
    assert!(body.is_empty(), "expected no entries, got {}", String::from_utf8_lossy(&body));
    assert_eq!(client.recv_reply().await, "226 done");
}

/// P8: the (N+1)th connection when the cap is N is refused at the greeting.
#[tokio::test]
async fn connection_cap_rejects_the_next_connection() {
    let (addr, _store, _blob) = spawn_server_with_handles(4 * 1024 * 1024, 1).await;

    let mut first = Client::connect(addr).await;
    assert_eq!(first.send("USER alice").await, "331 password required for alice");

    let mut second_stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    loop {
        second_stream.readable().await.unwrap();
        let mut chunk = [0u8; 256];
        match second_stream.try_read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.ends_with(b"\r\n") {
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => panic!("{e}"),
        }
    }
    let reply = String::from_utf8_lossy(&buf);
    assert!(reply.starts_with("421 "), "got {reply}");
}

/// `ABOR` against an in-flight `STOR` cancels it and replies with the
/// `426` then `226` pair the worker wrapper emits, not a lone `226`.
#[tokio::test]
async fn abor_cancels_an_in_flight_transfer_with_426_then_226() {
    let chunk_size = 4 * 1024 * 1024;
    let (addr, _store, _blob) = spawn_server_with_handles(chunk_size, 256).await;
    let mut client = Client::connect(addr).await;
    login(&mut client).await;

    let data = open_pasv_data(&mut client).await;
    assert_eq!(client.send("STOR stuck.bin").await, "150 about to start data transfer");
    // Leave `data` open with nothing written so the STOR task stays parked
    // waiting for bytes, guaranteeing ABOR finds it still in flight.

    assert_eq!(client.send("ABOR").await, "426 transfer aborted");
    assert_eq!(client.recv_reply().await, "226 abort successful");

    drop(data);
}

async fn wait_for_completed(store: &std::sync::Arc<meta_store_memory::MemoryMetadataStore>, parent: &str, name: &str) -> chunkftp::vfs::Node {
    for _ in 0..100 {
        if let Some(node) = store.find_one(parent, name).await.unwrap() {
            if node.status() == FileStatus::Completed {
                return node;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("upload of {parent}/{name} did not complete in time");
}
