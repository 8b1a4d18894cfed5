//! End-to-end tests over real TCP connections.

mod common;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use simp_http::access_log::AccessLog;
use simp_http::config::Config;
use simp_http::handler::{Dispatcher, JsonFileStore};
use simp_http::server::Listener;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

async fn start(dispatcher: Arc<Dispatcher>) -> SocketAddr {
    let mut cfg = Config::default();
    cfg.server.port = 0;

    let listener = Listener::bind(&cfg, dispatcher).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());
    addr
}

async fn start_harness(root: &Path) -> (SocketAddr, common::Harness) {
    let h = common::harness(root);
    let addr = start(Arc::clone(&h.dispatcher)).await;
    (addr, h)
}

async fn send(stream: &mut TcpStream, request: &[u8]) -> common::ParsedResponse {
    stream.write_all(request).await.unwrap();
    common::read_response(stream).await
}

#[tokio::test]
async fn test_get_root_lists_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let (addr, _h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, headers, body) = send(&mut stream, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(common::header(&headers, "Content-Type"), Some("text/html"));
    assert_eq!(common::header(&headers, "Server"), Some("SIMP-HTTP"));
    assert_eq!(common::header(&headers, "Connection"), Some("keep-alive"));
    assert!(common::header(&headers, "Date").unwrap().ends_with(" GMT"));

    let body = String::from_utf8(body).unwrap();
    assert!(body.contains(r#"<a href="a.txt">"#));
    assert!(body.contains(r#"<a href="sub/">"#));
}

#[tokio::test]
async fn test_get_subdirectory_lists_it() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("inner.css"), "b{}").unwrap();
    let (addr, _h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, _, body) = send(&mut stream, b"GET /sub HTTP/1.1\r\n\r\n").await;

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(String::from_utf8(body).unwrap().contains(r#"<a href="inner.css">inner.css</a>"#));
}

#[tokio::test]
async fn test_get_missing_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, headers, body) = send(&mut stream, b"GET /missing.xyz HTTP/1.1\r\n\r\n").await;

    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert_eq!(common::header(&headers, "Content-Type"), Some("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("Oops...404 NOT FOUND"));

    let entries = h.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, "GET");
    assert_eq!(entries[0].path, "/missing.xyz");
    assert_eq!(entries[0].status.as_u16(), 404);
}

#[tokio::test]
async fn test_path_outside_root_is_404() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("public");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(outer.path().join("secret.txt"), "hidden").unwrap();
    let (addr, _h) = start_harness(&root).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, _, _) = send(&mut stream, b"GET /../secret.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(status, "HTTP/1.1 404 Not Found");
}

#[tokio::test]
async fn test_static_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.html"), "<p>hi</p>").unwrap();
    let (addr, _h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (_, first, body) = send(&mut stream, b"GET /page.html HTTP/1.1\r\n\r\n").await;
    let (_, second, _) = send(&mut stream, b"GET /page.html HTTP/1.1\r\n\r\n").await;

    assert_eq!(body, b"<p>hi</p>");
    assert_eq!(common::header(&first, "Content-Type"), Some("text/html"));
    assert_eq!(common::header(&first, "Content-Length"), Some("9"));
    assert_eq!(
        common::header(&first, "Content-Length"),
        common::header(&second, "Content-Length")
    );
    assert!(common::header(&first, "Last-Modified").is_some());
    assert_eq!(
        common::header(&first, "Last-Modified"),
        common::header(&second, "Last-Modified")
    );
}

#[tokio::test]
async fn test_post_hands_form_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, _, body) = send(
        &mut stream,
        b"POST /submit HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 17\r\n\r\nname=Alice&age=30",
    )
    .await;

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, b"<h1>Data Saved successfully!</h1>");

    let saved = h.store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(
        serde_json::to_value(&saved[0]).unwrap(),
        json!([{"name": "Alice", "age": "30"}])
    );
}

#[tokio::test]
async fn test_post_overwrites_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("data").join("info.json");
    let log = Arc::new(common::RecordingAccessLog::default());
    let dispatcher = Arc::new(Dispatcher::new(
        dir.path(),
        Arc::new(JsonFileStore::new(&data_file)),
        Arc::clone(&log) as Arc<dyn AccessLog>,
    ));
    let addr = start(dispatcher).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    send(&mut stream, b"POST /submit HTTP/1.1\r\nContent-Length: 8\r\n\r\nname=Bob").await;
    send(&mut stream, b"POST /submit HTTP/1.1\r\nContent-Length: 17\r\n\r\nname=Alice&age=30").await;

    let written = std::fs::read_to_string(&data_file).unwrap();
    assert_eq!(
        written,
        "[\n    {\n        \"name\": \"Alice\",\n        \"age\": \"30\"\n    }\n]"
    );
}

#[tokio::test]
async fn test_options_advertises_methods() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, headers, body) = send(&mut stream, b"OPTIONS /anything HTTP/1.1\r\n\r\n").await;

    assert_eq!(status, "HTTP/1.1 204 No Content");
    assert_eq!(common::header(&headers, "Allow"), Some("GET, POST, OPTIONS"));
    assert_eq!(common::header(&headers, "Content-Length"), None);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_unknown_method_is_501_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, h) = start_harness(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let (status, _, body) = send(
        &mut stream,
        b"PATCH /x HTTP/1.1\r\nUser-Agent: test-agent/1.0\r\n\r\n",
    )
    .await;

    assert_eq!(status, "HTTP/1.1 501 Not Implemented");
    assert_eq!(body, b"<h1>501 Not Implemented</h1>");

    let entries = h.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, "PATCH");
    assert_eq!(entries[0].user_agent, "test-agent/1.0");
    assert_eq!(entries[0].client, stream.local_addr().unwrap());
}

#[tokio::test]
async fn test_connections_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _h) = start_harness(dir.path()).await;

    // holds its connection open without sending anything
    let _silent = TcpStream::connect(addr).await.unwrap();

    let mut active = TcpStream::connect(addr).await.unwrap();
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        send(&mut active, b"OPTIONS / HTTP/1.1\r\n\r\n"),
    )
    .await
    .expect("second connection was blocked by the first");

    assert_eq!(response.0, "HTTP/1.1 204 No Content");
}
