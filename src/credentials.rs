//! Credential Slot
//!
//! Holds the single analysis API key, optionally persisted as JSON on disk.
//! The key is forwarded verbatim; only its prefix format is checked here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{CacheError, Result};

/// Prefix every accepted API key starts with.
pub const API_KEY_PREFIX: &str = "sk-";

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    api_key: String,
}

/// Checks the local format rule for an API key and returns it trimmed.
pub fn validate_api_key(raw: &str) -> Result<String> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(CacheError::Validation("API key cannot be empty".to_string()));
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(CacheError::Validation(format!(
            "API key should start with \"{}\"",
            API_KEY_PREFIX
        )));
    }
    Ok(key.to_string())
}

pub struct CredentialStore {
    path: Option<PathBuf>,
    key: RwLock<Option<String>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the key
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Memory-only slot.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            key: RwLock::new(None),
        }
    }

    /// Slot backed by a JSON file. Call [`CredentialStore::load`] to read it.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            key: RwLock::new(None),
        }
    }

    /// Reads the persisted key, if any.
    ///
    /// A missing file is an empty slot. An unreadable or malformed file is
    /// logged and treated as empty.
    pub async fn load(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !fs::try_exists(path).await? {
            return Ok(());
        }

        let content = fs::read_to_string(path).await?;
        match serde_json::from_str::<StoredCredential>(&content) {
            Ok(stored) => {
                *self.key.write().await = Some(stored.api_key);
                info!("Loaded stored API key");
            }
            Err(e) => warn!(error = %e, path = %path.display(), "Ignoring malformed credential file"),
        }
        Ok(())
    }

    /// Validates and stores a new key, replacing any previous one.
    pub async fn set(&self, raw: &str) -> Result<()> {
        let key = validate_api_key(raw)?;

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string(&StoredCredential {
                api_key: key.clone(),
            })
            .map_err(|e| CacheError::Internal(e.to_string()))?;
            fs::write(path, content).await?;
        }

        *self.key.write().await = Some(key);
        info!("API key updated");
        Ok(())
    }

    pub async fn get(&self) -> Option<String> {
        self.key.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.key.read().await.is_some()
    }

    pub async fn clear(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if fs::try_exists(path).await? {
                fs::remove_file(path).await?;
            }
        }
        *self.key.write().await = None;
        info!("API key cleared");
        Ok(())
    }
}
