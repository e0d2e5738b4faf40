//! Common test utilities for client integration tests
//!
//! Provides shared helpers for:
//! - A stub HTTP endpoint speaking just enough of the query service protocol
//! - Building connections pointed at the stub with fast timeouts
//! - Canned engine response envelopes

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use asterix_client::{Connection, ConnectionBuilder};

/// One canned answer the stub returns for a request.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// In-process HTTP endpoint that answers each request with the next canned
/// response (repeating the last one once the script runs out) and records
/// every request body it sees.
pub struct StubServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        assert!(!responses.is_empty(), "stub needs at least one response");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub listener");
        let addr = listener.local_addr().expect("stub has no local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let task_hits = Arc::clone(&hits);
        let task_bodies = Arc::clone(&bodies);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let hit = task_hits.fetch_add(1, Ordering::SeqCst);
                let response = responses
                    .get(hit)
                    .unwrap_or_else(|| responses.last().unwrap())
                    .clone();

                let body = read_request_body(&mut socket).await;
                task_bodies.lock().push(body);

                let reason = match response.status {
                    200 => "OK",
                    500 => "Internal Server Error",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let payload = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    reason,
                    response.body.len(),
                    response.body
                );
                let _ = socket.write_all(payload.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: format!("http://{addr}"),
            hits,
            bodies,
        }
    }

    /// Number of requests the stub has answered.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Percent-decoded request bodies, oldest first.
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().iter().map(|b| percent_decode(b)).collect()
    }
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let header_end = find_header_end(&buf);
        if let Some(end) = header_end {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                return String::from_utf8_lossy(&buf[end + 4..end + 4 + content_length])
                    .into_owned();
            }
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => {
                return String::new();
            }
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn percent_decode(body: &str) -> String {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Connection against the stub with fast retry timing so failure tests do
/// not sleep for real backoff durations.
pub fn connect(url: &str) -> Connection {
    ConnectionBuilder::new(url)
        .max_pool_size(2)
        .acquire_timeout(Duration::from_secs(2))
        .request_timeout(Duration::from_secs(5))
        .max_retries(3)
        .backoff(Duration::from_millis(2), Duration::from_millis(10))
        .build()
        .expect("failed to build connection")
}

/// Success envelope carrying the given results array.
pub fn success_envelope(results: serde_json::Value) -> String {
    serde_json::json!({
        "requestID": "req-1",
        "clientContextID": "ctx-1",
        "status": "success",
        "results": results,
        "metrics": {"elapsedTime": "1ms", "resultCount": 0},
    })
    .to_string()
}

/// Fatal envelope carrying one engine diagnostic.
pub fn fatal_envelope(code: i64, msg: &str) -> String {
    serde_json::json!({
        "requestID": "req-1",
        "status": "fatal",
        "errors": [{"code": code, "msg": msg}],
    })
    .to_string()
}
