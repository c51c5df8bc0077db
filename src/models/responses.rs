//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::analysis::Profile;
use crate::cache::{CacheSize, CachedImage};

/// Response body for `POST /images`
#[derive(Debug, Clone, Serialize)]
pub struct CacheImageResponse {
    /// Success message
    pub message: String,
    /// Id of the new entry
    pub id: String,
}

impl CacheImageResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Image '{}' cached successfully", id),
            id,
        }
    }
}

/// Image metadata without content, used by `GET /images`
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
    /// Creation time in ISO 8601 format
    pub cached_at: String,
}

impl From<&CachedImage> for ImageSummary {
    fn from(image: &CachedImage) -> Self {
        let cached_at = Utc
            .timestamp_millis_opt(image.timestamp as i64)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        Self {
            id: image.id.clone(),
            file_name: image.file_name.clone(),
            file_size: image.file_size,
            file_type: image.file_type.clone(),
            timestamp: image.timestamp,
            cached_at,
        }
    }
}

/// Response body for `GET /images/:id/payload`
#[derive(Debug, Clone, Serialize)]
pub struct PayloadResponse {
    pub id: String,
    /// Base64 content without data-URI prefix
    pub payload: String,
}

/// Response body for `DELETE /images/:id`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    /// Success message
    pub message: String,
    /// The id that was removed
    pub id: String,
}

impl RemoveResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Image '{}' removed", id),
            id,
        }
    }
}

/// Response body for `DELETE /images`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Image cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for `GET /images/size`
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    /// Live entries
    pub count: usize,
    /// Sum of their sizes in bytes
    pub total_bytes: u64,
}

impl From<CacheSize> for SizeResponse {
    fn from(size: CacheSize) -> Self {
        Self {
            count: size.count,
            total_bytes: size.total_bytes,
        }
    }
}

/// Response body for `POST /maintenance/sweep`
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Expired entries physically deleted
    pub removed: usize,
}

/// Response body for `GET /credentials`
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatusResponse {
    pub configured: bool,
}

/// Response body for `POST /enhance`
#[derive(Debug, Clone, Serialize)]
pub struct EnhanceResponse {
    /// Report text from the analysis backend, verbatim
    pub report: String,
}

/// Response body for `GET /profiles`
#[derive(Debug, Clone, Serialize)]
pub struct ProfilesResponse {
    /// Role profiles keyed by profile key
    pub profiles: HashMap<String, Profile>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, "healthy" or "degraded"
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether the image store finished initializing
    pub store_ready: bool,
    /// Whether the analysis backend answered its health check
    pub analysis_backend: bool,
}

impl HealthResponse {
    /// Reports "healthy" only when the store is ready.
    pub fn with_store(store_ready: bool) -> Self {
        Self {
            status: if store_ready { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            store_ready,
            analysis_backend: false,
        }
    }

    /// Records backend reachability. The local cache stays usable without
    /// it, so this does not change `status`.
    pub fn with_analysis_backend(mut self, reachable: bool) -> Self {
        self.analysis_backend = reachable;
        self
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
