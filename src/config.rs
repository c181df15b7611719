use crate::error::{ServerError, ServerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    // Network configuration
    pub listen_address: String,
    pub port: u16,
    pub backlog_size: u32,

    // Thread configuration
    pub worker_threads: usize,

    // Filesystem root served under /static/
    pub static_root: PathBuf,

    // Per-connection limits
    pub initial_buffer_size: usize,
    pub max_header_size: usize,
    pub max_body_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            backlog_size: 1024,

            worker_threads: num_cpus::get(),

            static_root: PathBuf::from("static"),

            initial_buffer_size: 4 * 1024,  // 4 KB
            max_header_size: 16 * 1024,     // 16 KB
            max_body_size: 1024 * 1024,     // 1 MB
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address and port to listen on
    pub fn with_address(mut self, address: &str, port: u16) -> Self {
        self.listen_address = address.to_string();
        self.port = port;
        self
    }

    /// Set the directory served under `/static/`
    pub fn with_static_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.static_root = root.into();
        self
    }

    /// Set the header and body size limits
    pub fn with_limits(mut self, max_header_size: usize, max_body_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self.max_body_size = max_body_size;
        self
    }

    /// Set the read and write deadlines
    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// Set the number of worker threads
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Get the full address string (address:port)
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> ServerResult<()> {
        if self.worker_threads == 0 {
            return Err(ServerError::Config("worker_threads must be at least 1".to_string()));
        }
        if self.max_header_size == 0 {
            return Err(ServerError::Config("max_header_size must be non-zero".to_string()));
        }
        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ServerError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ServerResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_json_file<P: AsRef<Path>>(&self, path: P) -> ServerResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
