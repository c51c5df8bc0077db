//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming JSON request bodies. Image uploads
//! arrive as multipart and have no DTO.

use serde::Deserialize;

/// Request body for `PUT /credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct SetApiKeyRequest {
    /// Key to store; must start with `sk-`
    pub api_key: String,
}

/// Request body for `POST /enhance`
///
/// # Fields
/// - `image_id`: Optional cached image to ground the prompt on
/// - `message`: Free-text instruction; a default is used when blank
/// - `profile_key`: Role profile understood by the analysis backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub profile_key: Option<String>,
}

impl EnhanceRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if matches!(&self.image_id, Some(id) if id.trim().is_empty()) {
            return Some("image_id cannot be empty".to_string());
        }
        if matches!(&self.profile_key, Some(key) if key.trim().is_empty()) {
            return Some("profile_key cannot be empty".to_string());
        }
        None
    }
}
