mod common;

use common::{spawn_server, Client};

/// End-to-end scenario 1: login, then list an empty home directory.
#[tokio::test]
async fn login_and_list_empty_home() {
    let addr = spawn_server(64 * 1024 * 1024, 256).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("USER alice").await, "331 password required for alice");
    assert_eq!(client.send("PASS secret").await, "230 login successful");
    assert_eq!(client.send("PWD").await, "257 \"/alice\" is the current directory");

    let pasv = client.send("PASV").await;
    assert!(pasv.starts_with("227 "));
    let data_addr = common::parse_pasv_addr(&pasv);
    let mut data = tokio::net::TcpStream::connect(data_addr).await.unwrap();

    assert_eq!(client.send("LIST").await, "150 listing");
    let body = common::read_all(&mut data).await;
    assert!(body.is_empty());
}

/// Scenario 5: an unrecognized verb gets `502`.
#[tokio::test]
async fn unknown_command_is_rejected() {
    let addr = spawn_server(64 * 1024 * 1024, 256).await;
    let mut client = Client::connect(addr).await;
    assert_eq!(client.send("XYZZY").await, "502 command not implemented");
}

/// Commands that require a logged-in session are rejected before login.
#[tokio::test]
async fn commands_require_login() {
    let addr = spawn_server(64 * 1024 * 1024, 256).await;
    let mut client = Client::connect(addr).await;
    let reply = client.send("PWD").await;
    assert!(reply.starts_with("530 "), "got {reply}");
}

/// Bad password is rejected with `530` and does not log the session in.
#[tokio::test]
async fn bad_password_is_rejected() {
    let addr = spawn_server(64 * 1024 * 1024, 256).await;
    let mut client = Client::connect(addr).await;
    client.send("USER alice").await;
    let reply = client.send("PASS wrong").await;
    assert!(reply.starts_with("530 "), "got {reply}");
    let reply = client.send("PWD").await;
    assert!(reply.starts_with("530 "), "got {reply}");
}

/// P7: a user with only the synthesized `{/, readable=true}` rule can list
/// the root but is denied write operations anywhere under it.
#[tokio::test]
async fn permission_gate_denies_writes_without_a_grant() {
    let addr = spawn_server(64 * 1024 * 1024, 256).await;
    let mut client = Client::connect(addr).await;
    client.send("USER reader").await;
    client.send("PASS secret").await;

    assert_eq!(client.send("CWD /").await, "250 directory changed");
    assert!(client.send("MKD /x").await.starts_with("550 "));
    assert!(client.send("DELE /z").await.starts_with("550 "));

    let pasv = client.send("PASV").await;
    let data_addr = common::parse_pasv_addr(&pasv);
    let _data = tokio::net::TcpStream::connect(data_addr).await.unwrap();
    assert!(client.send("STOR /y").await.starts_with("550 "));
}
