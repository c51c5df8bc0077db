//! Cached Image Entry Module
//!
//! Defines the stored image record, the upload input, and data-URI helpers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::ID_PREFIX;

// == Image Upload ==
/// A file handed to the store for caching.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original filename, display-only
    pub file_name: String,
    /// Declared MIME type
    pub file_type: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Byte length of the file.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// == Cached Image ==
/// A stored image with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedImage {
    /// Unique id, the only lookup key
    pub id: String,
    /// Original filename
    pub file_name: String,
    /// Original byte length
    pub file_size: u64,
    /// MIME type, always `image/*`
    pub file_type: String,
    /// `data:<mime>;base64,<payload>`
    pub content: String,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
}

impl CachedImage {
    // == Constructor ==
    /// Builds an entry from an upload, encoding the bytes as a data URI.
    pub fn from_upload(id: String, upload: &ImageUpload, timestamp: u64) -> Self {
        Self {
            id,
            file_name: upload.file_name.clone(),
            file_size: upload.size() as u64,
            file_type: upload.file_type.clone(),
            content: to_data_url(&upload.file_type, &upload.bytes),
            timestamp,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived the retention window.
    ///
    /// Boundary: an entry is expired once `now - timestamp >= retention_ms`.
    /// A timestamp in the future counts as age zero.
    pub fn is_expired(&self, now_ms: u64, retention_ms: u64) -> bool {
        self.age_ms(now_ms) >= retention_ms
    }

    /// Milliseconds since the entry was created.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// Base64 payload with the data-URI prefix stripped.
    pub fn encoded_payload(&self) -> &str {
        strip_data_url_prefix(&self.content)
    }

    /// Decodes the stored content back into the original bytes.
    pub fn decode_bytes(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.encoded_payload())
    }
}

// == Utility Functions ==
/// Generates a fresh id of the form `img_<unix-ms>_<9 random chars>`.
pub fn generate_image_id(now_ms: u64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}_{}", ID_PREFIX, now_ms, &suffix[..9])
}

/// Encodes bytes as a self-describing data URI.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Returns everything after the first comma, or the input unchanged when
/// there is no data-URI prefix.
pub fn strip_data_url_prefix(content: &str) -> &str {
    match content.split_once(',') {
        Some((_, payload)) => payload,
        None => content,
    }
}
