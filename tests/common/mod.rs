//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

use search_frontend::config::AppConfig;
use search_frontend::observability::logging::BuildInfo;
use search_frontend::{HttpServer, Logger};

/// In-memory log destination.
#[derive(Clone, Default)]
pub struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl BufferWriter {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Every line parsed as a JSON object.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Log destination whose every write fails.
#[derive(Clone, Copy, Default)]
pub struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for FailingWriter {
    type Writer = FailingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

/// A logger writing console and JSON output to memory.
pub struct TestLogger {
    pub logger: Logger,
    pub console: BufferWriter,
    pub json: BufferWriter,
}

impl TestLogger {
    pub fn new(level: LevelFilter) -> Self {
        let console = BufferWriter::default();
        let json = BufferWriter::default();
        let logger = Logger::builder()
            .level(level)
            .console_writer(console.clone(), false)
            .json_writer(json.clone())
            .build_info(BuildInfo {
                git_revision: "0123abcd".to_string(),
                rust_version: "1.85.0".to_string(),
            })
            .build();
        Self {
            logger,
            console,
            json,
        }
    }

    /// JSON records at `level` ("info", "error", ...).
    pub fn records_at(&self, level: &str) -> Vec<Value> {
        self.json
            .records()
            .into_iter()
            .filter(|r| r["level"] == level)
            .collect()
    }

    /// The single access-log record.
    pub fn access_log(&self) -> Value {
        let mut records: Vec<Value> = self
            .json
            .records()
            .into_iter()
            .filter(|r| {
                r["message"]
                    .as_str()
                    .is_some_and(|m| m.ends_with("completed"))
            })
            .collect();
        assert_eq!(records.len(), 1, "expected exactly one access log record");
        records.remove(0)
    }
}

/// A stub search API on an ephemeral port.
pub struct StubUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubUpstream {
    pub fn endpoint(&self) -> String {
        format!("http://{}/w/api.php", self.addr)
    }

    /// Request targets received so far, as absolute URLs.
    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|target| Url::parse(&format!("http://{}{}", self.addr, target)).unwrap())
            .collect()
    }

    /// Value of a query parameter on the `n`th request.
    pub fn param(&self, n: usize, key: &str) -> Option<String> {
        self.requests()
            .get(n)?
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// Start a stub search API that answers every request with `f()`.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> StubUpstream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&buf);
                        if let Some(target) = head.split_whitespace().nth(1) {
                            seen.lock().unwrap().push(target.to_string());
                        }

                        let (status, body) = f().await;
                        let reason = StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    StubUpstream { addr, requests }
}

/// Stub upstream with a fixed answer.
pub async fn start_stub_upstream(status: u16, body: String) -> StubUpstream {
    start_programmable_upstream(move || {
        let body = body.clone();
        async move { (status, body) }
    })
    .await
}

/// A search API body with `totalhits` and one result per title.
pub fn search_body(totalhits: u64, titles: &[&str]) -> String {
    let results: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "ns": 0,
                "title": title,
                "pageid": i + 1,
                "size": 1000,
                "wordcount": 150,
                "snippet": format!("<span class=\"searchmatch\">{}</span> snippet", title),
                "timestamp": "2024-05-01T10:00:00Z"
            })
        })
        .collect();
    json!({
        "batchcomplete": "",
        "query": {
            "searchinfo": { "totalhits": totalhits },
            "search": results
        }
    })
    .to_string()
}

/// Config pointing at `endpoint`, with the file sink disabled.
pub fn test_config(endpoint: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.search.endpoint = endpoint.to_string();
    config.search.system_proxy = false;
    config.search.timeout_secs = 5;
    config.logging.file.enabled = false;
    config
}

/// The fully layered router.
pub fn app(endpoint: &str, logger: &Logger) -> Router {
    HttpServer::new(&test_config(endpoint), logger.clone())
        .unwrap()
        .router()
}
