//! End-to-end tests over real sockets.
//!
//! These drive a live server through the public client and, where the byte
//! layout itself is the contract, through raw TCP streams.

use std::time::{Duration, SystemTime};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use trelliskv::client::Client;
use trelliskv::protocol::types::{self, Command};
use trelliskv::server::Server;

async fn start_server() -> (Server, Client) {
    let mut server = Server::new("127.0.0.1:0");
    server.start().await.unwrap();
    let client = Client::new(server.local_addr().unwrap().to_string());
    (server, client)
}

/// Writes raw bytes to the server and returns everything it sends back.
async fn raw_exchange(server: &Server, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(server.local_addr().unwrap())
        .await
        .unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn insert_then_read_round_trip() {
    let (mut server, client) = start_server().await;

    assert!(client.insert("testkey", "abc123").await.unwrap());
    assert_eq!(
        client.read("testkey").await.unwrap().as_deref(),
        Some("abc123")
    );

    server.stop().await;
}

#[tokio::test]
async fn canonical_ack_and_null_bytes_on_the_wire() {
    let (mut server, _) = start_server().await;

    // INSERT on a fresh key answers with the canonical 8-byte ACK.
    let request = types::encode_message(Command::Insert, &["k", "v"]);
    let response = raw_exchange(&server, &request).await;
    assert_eq!(response, [0x08, 0x00, 0x00, 0x00, 0x7C, b'A', b'C', b'K']);

    // READ on a missing key answers with the canonical 9-byte NULL.
    let request = types::encode_message(Command::Read, &["missing"]);
    let response = raw_exchange(&server, &request).await;
    assert_eq!(
        response,
        [0x09, 0x00, 0x00, 0x00, 0x7C, b'N', b'U', b'L', b'L']
    );

    server.stop().await;
}

#[tokio::test]
async fn read_response_echoes_the_command_with_payload() {
    let (mut server, client) = start_server().await;

    client.insert("testkey", "abc123").await.unwrap();

    let request = types::encode_message(Command::Read, &["testkey"]);
    let response = raw_exchange(&server, &request).await;
    assert_eq!(response, types::encode_message(Command::Read, &["abc123"]));

    // The embedded length field matches the frame size exactly.
    let declared =
        u32::from_le_bytes([response[0], response[1], response[2], response[3]]) as usize;
    assert_eq!(declared, response.len());

    server.stop().await;
}

#[tokio::test]
async fn unknown_command_answers_with_err() {
    let (mut server, _) = start_server().await;

    let body = b"|BOGUS";
    let mut request = Vec::new();
    request.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    request.extend_from_slice(body);

    let response = raw_exchange(&server, &request).await;
    assert_eq!(&response[5..8], b"ERR");

    server.stop().await;
}

#[tokio::test]
async fn expire_then_read_after_wait() {
    let (mut server, client) = start_server().await;

    client.insert("k", "v").await.unwrap();
    client
        .expire("k", SystemTime::now() + Duration::from_millis(100))
        .await
        .unwrap();

    assert_eq!(client.read("k").await.unwrap().as_deref(), Some("v"));

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(client.read("k").await.unwrap().is_none());

    // Reinserting revives the key with no expiration carried over.
    assert!(client.insert("k", "new").await.unwrap());
    assert!(client.read_expiration("k").await.unwrap().is_none());
    assert_eq!(client.read("k").await.unwrap().as_deref(), Some("new"));

    server.stop().await;
}

#[tokio::test]
async fn prefix_commands_against_a_populated_store() {
    let (mut server, client) = start_server().await;

    for (key, value) in [
        ("region:1:store:1:employee:1", "a"),
        ("region:1:store:1:employee:2", "b"),
        ("region:1:manager", "c"),
        ("category:3:product:7", "d"),
    ] {
        client.insert(key, value).await.unwrap();
    }

    let mut keys = client.keys_by("region:1:store:1").await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec!["region:1:store:1:employee:1", "region:1:store:1:employee:2"]
    );
    assert!(client.keys_by("reg").await.unwrap().is_empty());
    assert_eq!(client.keys_by("").await.unwrap().len(), 4);

    assert_eq!(client.delete_by("region:1").await.unwrap(), 3);
    assert_eq!(client.count().await.unwrap(), 1);
    assert_eq!(
        client.keys_by("").await.unwrap(),
        vec!["category:3:product:7"]
    );

    server.stop().await;
}

#[tokio::test]
async fn mixed_workload_smoke() {
    let (mut server, client) = start_server().await;

    assert!(client.insert("user:1:name", "alice").await.unwrap());
    assert!(client.insert("user:1:email", "alice@example.com").await.unwrap());
    assert!(client.insert("user:2:name", "bob").await.unwrap());

    assert!(client.update("user:2:name", "robert").await.unwrap());
    client.upsert("user:2:email", "bob@example.com").await.unwrap();

    assert_eq!(client.count().await.unwrap(), 4);
    assert_eq!(client.keys_by("user:1").await.unwrap().len(), 2);

    assert!(client.delete("user:1:email").await.unwrap());
    assert!(!client.delete("user:1:email").await.unwrap());

    assert_eq!(
        client
            .expire_by("user:2", SystemTime::now() + Duration::from_millis(5))
            .await
            .unwrap(),
        2
    );
    tokio::time::sleep(Duration::from_millis(30)).await;

    let keys = client.keys_by("").await.unwrap();
    assert_eq!(keys, vec!["user:1:name"]);

    client.truncate().await.unwrap();
    assert_eq!(client.count().await.unwrap(), 0);

    server.stop().await;
}
