#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use simp_http::access_log::{AccessEntry, AccessLog};
use simp_http::handler::{Dispatcher, FormData, FormStore};

/// Keeps every access entry in memory.
#[derive(Default)]
pub struct RecordingAccessLog {
    entries: Mutex<Vec<AccessEntry>>,
}

impl RecordingAccessLog {
    pub fn entries(&self) -> Vec<AccessEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl AccessLog for RecordingAccessLog {
    fn record(&self, entry: &AccessEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Keeps every saved submission in memory.
#[derive(Default)]
pub struct RecordingStore {
    saved: Mutex<Vec<Vec<FormData>>>,
}

impl RecordingStore {
    pub fn saved(&self) -> Vec<Vec<FormData>> {
        self.saved.lock().unwrap().clone()
    }
}

impl FormStore for RecordingStore {
    fn save(&self, records: &[FormData]) -> anyhow::Result<()> {
        self.saved.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub log: Arc<RecordingAccessLog>,
    pub store: Arc<RecordingStore>,
}

pub fn harness(root: &Path) -> Harness {
    let log = Arc::new(RecordingAccessLog::default());
    let store = Arc::new(RecordingStore::default());
    let dispatcher = Arc::new(Dispatcher::new(
        root,
        Arc::clone(&store) as Arc<dyn FormStore>,
        Arc::clone(&log) as Arc<dyn AccessLog>,
    ));

    Harness { dispatcher, log, store }
}

pub fn client_addr() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// Splits a serialized response into status line, header lines and body.
pub fn split_response(raw: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = std::str::from_utf8(&raw[..end]).unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().to_string();
    let headers = lines
        .map(|l| {
            let (k, v) = l.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    (status, headers, raw[end + 4..].to_vec())
}

pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

pub type ParsedResponse = (String, Vec<(String, String)>, Vec<u8>);

/// Splits a byte stream holding several responses, framed by Content-Length.
pub fn split_responses(mut raw: &[u8]) -> Vec<ParsedResponse> {
    let mut out = Vec::new();

    while !raw.is_empty() {
        let end = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("no header terminator")
            + 4;
        let (status, headers, _) = split_response(&raw[..end]);
        let len: usize = header(&headers, "Content-Length")
            .map(|v| v.parse().unwrap())
            .unwrap_or(0);

        out.push((status, headers, raw[end..end + len].to_vec()));
        raw = &raw[end + len..];
    }

    out
}

/// Reads exactly one response from `stream`.
pub async fn read_response<R>(stream: &mut R) -> ParsedResponse
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let (status, headers, _) = split_response(&buf[..end + 4]);
            let len: usize = header(&headers, "Content-Length")
                .map(|v| v.parse().unwrap())
                .unwrap_or(0);

            while buf.len() < end + 4 + len {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed mid-response");
                buf.extend_from_slice(&chunk[..n]);
            }

            return (status, headers, buf[end + 4..end + 4 + len].to_vec());
        }

        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before a response arrived");
        buf.extend_from_slice(&chunk[..n]);
    }
}
