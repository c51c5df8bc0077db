//! Image Repository Module
//!
//! Storage seam for cached images plus the in-memory backend.
//!
//! Repositories hold raw records. Expiry is decided by the store, so a
//! repository happily returns expired rows until something deletes them.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::CachedImage;
use crate::error::{CacheError, Result};

// == Repository Trait ==
/// Raw persistence for cached images, keyed by id.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Inserts a new record. An existing id is a storage failure.
    async fn insert(&self, image: CachedImage) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<CachedImage>>;

    /// Removes a record, returning whether it existed.
    async fn remove(&self, id: &str) -> Result<bool>;

    async fn list(&self) -> Result<Vec<CachedImage>>;

    /// Removes every record, returning how many there were.
    async fn clear(&self) -> Result<usize>;

    /// Removes records with `timestamp <= cutoff_ms`.
    async fn remove_created_before(&self, cutoff_ms: u64) -> Result<usize>;
}

// == Memory Repository ==
/// HashMap-backed repository. Contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: RwLock<HashMap<String, CachedImage>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageRepository for MemoryRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, image: CachedImage) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&image.id) {
            return Err(CacheError::StorageUnavailable(format!(
                "duplicate image id {}",
                image.id
            )));
        }
        entries.insert(image.id.clone(), image);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CachedImage>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<CachedImage>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }

    async fn remove_created_before(&self, cutoff_ms: u64) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, image| image.timestamp > cutoff_ms);
        Ok(before - entries.len())
    }
}
