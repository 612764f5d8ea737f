#![allow(dead_code)]

use async_trait::async_trait;
use github_star_sync::error::{Result, StarSyncError};
use github_star_sync::github::StarSource;
use github_star_sync::models::{BatchResult, Descriptor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Write `<root>/<slug>/project.json` with the given body.
pub fn write_project(root: &Path, slug: &str, body: &str) {
    let dir = root.join(slug);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("project.json"), body).unwrap();
}

pub fn read_project(root: &Path, slug: &str) -> String {
    std::fs::read_to_string(root.join(slug).join("project.json")).unwrap()
}

/// In-memory star source keyed by `github_repo` URL.
///
/// Batches listed in `failing_batches` (0-based call index) return an
/// error instead of counts.
#[derive(Default)]
pub struct FakeSource {
    pub stars: HashMap<String, u64>,
    pub failing_batches: Vec<usize>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
    pub fn with_stars(stars: &[(&str, u64)]) -> Self {
        Self {
            stars: stars.iter().map(|(url, n)| (url.to_string(), *n)).collect(),
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StarSource for FakeSource {
    async fn fetch_batch(&self, batch: &[Descriptor]) -> Result<BatchResult> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(batch.iter().map(|d| d.slug.clone()).collect());
            calls.len() - 1
        };

        if self.failing_batches.contains(&call) {
            return Err(StarSyncError::HttpStatus {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }

        let counts = batch
            .iter()
            .map(|d| d.github_repo().and_then(|url| self.stars.get(url)).copied().unwrap_or(0))
            .collect();

        Ok(BatchResult { counts, rate_limit: None })
    }
}

/// A captured HTTP request as seen by [`FakeGraphQl`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Minimal HTTP responder that answers each connection with the next
/// canned `(status, body)` pair.
pub struct FakeGraphQl {
    pub url: Url,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeGraphQl {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                let request = read_request(&mut socket).await;
                captured.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    if status < 400 { "OK" } else { "ERROR" },
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: Url::parse(&format!("http://{}/graphql", addr)).unwrap(),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let length = content_length(&head);
            if buf.len() >= end + 4 + length {
                let body = String::from_utf8_lossy(&buf[end + 4..end + 4 + length]).to_string();
                return CapturedRequest { head, body };
            }
        }
    }

    CapturedRequest {
        head: String::from_utf8_lossy(&buf).to_string(),
        body: String::new(),
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
