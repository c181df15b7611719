//! Shared helpers for integration tests.
#![allow(dead_code)]

use rand::Rng;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiny_http_core::routes::default_router;
use tiny_http_core::{Server, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// A scratch directory removed on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let suffix: u64 = rand::thread_rng().gen();
        let path = std::env::temp_dir().join(format!("{}-{:016x}", prefix, suffix));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file, contents).unwrap();
        file
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// A server running on an ephemeral port, stopped on drop
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(static_root: &Path) -> Self {
        let config = ServerConfig::new()
            .with_address("127.0.0.1", 0)
            .with_static_root(static_root)
            .with_limits(4 * 1024, 64 * 1024)
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(500))
            .with_worker_threads(2);

        let server = Server::bind(&config, default_router()).unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    /// Send raw bytes and collect everything until the server closes
    pub async fn send(&self, raw: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut response = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
            .await
            .expect("server did not close the connection")
            .unwrap();
        response
    }

    pub async fn send_str(&self, raw: &str) -> String {
        String::from_utf8(self.send(raw.as_bytes()).await).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Split a raw response into its head and body
pub fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    (
        String::from_utf8_lossy(&raw[..end]).into_owned(),
        raw[end + 4..].to_vec(),
    )
}
