// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

use crate::http::RangePolicy;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub streaming: StreamingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Threshold: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for a client to send request headers
    pub header_read_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    /// Allowed origin; `*` when CORS is enabled without one
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl HttpConfig {
    /// Origin to advertise in CORS headers, `None` when CORS is off
    pub fn allowed_origin(&self) -> Option<&str> {
        self.enable_cors
            .then(|| self.cors_origin.as_deref().unwrap_or("*"))
    }
}

/// Blob store configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the media files
    pub media_dir: String,
    /// Optional TOML manifest describing catalog entries
    #[serde(default)]
    pub manifest_file: Option<String>,
    /// Index every allowed media file found in `media_dir`
    pub auto_index: bool,
}

/// Streaming configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamingConfig {
    /// When false, `Range` is ignored and whole objects are sent
    pub enabled: bool,
    /// Read buffer size for streamed bodies, in bytes
    pub chunk_size: usize,
    #[serde(default)]
    pub range_policy: RangePolicy,
}
