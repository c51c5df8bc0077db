//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which embedded backend holds cached images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// SQLite file under the data directory
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The 24h retention window and the 10 MiB upload cap are fixed and not
/// configurable here.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Storage backend for cached images
    pub storage_backend: StorageBackend,
    /// Directory holding the SQLite file and the credential file
    pub data_dir: PathBuf,
    /// Upper bound on a single storage call in milliseconds
    pub storage_timeout_ms: u64,
    /// Periodic sweep interval in seconds, 0 disables the task
    pub sweep_interval: u64,
    /// Base URL of the analysis backend, including the `/api` prefix
    pub analysis_api_url: String,
    /// Request timeout for analysis calls in seconds
    pub analysis_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_BACKEND` - `memory` or `sqlite` (default: sqlite)
    /// - `DATA_DIR` - Data directory (default: ./data)
    /// - `STORAGE_TIMEOUT_MS` - Storage call timeout (default: 5000)
    /// - `SWEEP_INTERVAL` - Periodic sweep in seconds, 0 = off (default: 0)
    /// - `ANALYSIS_API_URL` - Analysis backend (default: http://localhost:8000/api)
    /// - `ANALYSIS_TIMEOUT_SECS` - Analysis request timeout (default: 120)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            storage_backend: parse_var("STORAGE_BACKEND").unwrap_or(defaults.storage_backend),
            data_dir: env::var("DATA_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_timeout_ms: parse_var("STORAGE_TIMEOUT_MS")
                .unwrap_or(defaults.storage_timeout_ms),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            analysis_api_url: env::var("ANALYSIS_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.analysis_api_url),
            analysis_timeout_secs: parse_var("ANALYSIS_TIMEOUT_SECS")
                .unwrap_or(defaults.analysis_timeout_secs),
        }
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("images.db")
    }

    /// Path of the persisted API key.
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            storage_backend: StorageBackend::Sqlite,
            data_dir: PathBuf::from("./data"),
            storage_timeout_ms: 5000,
            sweep_interval: 0,
            analysis_api_url: "http://localhost:8000/api".to_string(),
            analysis_timeout_secs: 120,
        }
    }
}
