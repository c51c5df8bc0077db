//! Image Cache Store Module
//!
//! Main cache engine: validation gate, id generation, soft expiry and the
//! expiry sweep, on top of a single repository handle opened once by `init`.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::{
    generate_image_id, CacheSize, CachedImage, Clock, ImageRepository, ImageUpload,
    MemoryRepository, SqliteRepository, SystemClock, DEFAULT_RETENTION_SECS, IMAGE_MIME_PREFIX,
    MAX_FILE_SIZE,
};
use crate::config::{Config, StorageBackend};
use crate::error::{CacheError, Result};

// == Backend Selection ==
/// Repository opened by [`ImageCacheStore::init`].
#[derive(Clone)]
pub enum Backend {
    Memory,
    Sqlite(PathBuf),
    /// Caller-supplied repository, used as-is.
    Custom(Arc<dyn ImageRepository>),
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "Memory"),
            Backend::Sqlite(path) => f.debug_tuple("Sqlite").field(path).finish(),
            Backend::Custom(repo) => write!(f, "Custom({})", repo.name()),
        }
    }
}

impl Backend {
    pub fn from_config(config: &Config) -> Self {
        match config.storage_backend {
            StorageBackend::Memory => Backend::Memory,
            StorageBackend::Sqlite => Backend::Sqlite(config.database_path()),
        }
    }

    async fn open(&self) -> Result<Arc<dyn ImageRepository>> {
        let repo: Arc<dyn ImageRepository> = match self {
            Backend::Memory => Arc::new(MemoryRepository::new()),
            Backend::Sqlite(path) => Arc::new(SqliteRepository::open(path).await?),
            Backend::Custom(repo) => Arc::clone(repo),
        };
        Ok(repo)
    }
}

// == Store Options ==
/// Policy knobs for the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Entries at least this old are expired
    pub retention: Duration,
    /// Largest accepted upload in bytes (inclusive)
    pub max_file_size: usize,
    /// Upper bound on any single repository call, including opening it
    pub op_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(DEFAULT_RETENTION_SECS),
            max_file_size: MAX_FILE_SIZE,
            op_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreOptions {
    /// Only the storage timeout comes from configuration; retention and the
    /// size cap stay at their fixed values.
    pub fn from_config(config: &Config) -> Self {
        Self {
            op_timeout: Duration::from_millis(config.storage_timeout_ms),
            ..Self::default()
        }
    }
}

// == Image Cache Store ==
/// Local store of uploaded images addressable by opaque id.
///
/// Construct with [`ImageCacheStore::new`], then call [`ImageCacheStore::init`]
/// once before use. Every operation on an uninitialized store fails with
/// [`CacheError::StorageUnavailable`].
pub struct ImageCacheStore {
    backend: Backend,
    repo: OnceCell<Arc<dyn ImageRepository>>,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
}

impl fmt::Debug for ImageCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCacheStore")
            .field("backend", &self.backend)
            .field("ready", &self.is_ready())
            .field("options", &self.options)
            .finish()
    }
}

impl ImageCacheStore {
    // == Constructor ==
    /// Creates an unready store using the wall clock.
    pub fn new(backend: Backend, options: StoreOptions) -> Self {
        Self {
            backend,
            repo: OnceCell::new(),
            clock: Arc::new(SystemClock),
            options,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Backend::from_config(config), StoreOptions::from_config(config))
    }

    // == Lifecycle ==
    /// Opens the backend. Calling it again on a ready store is a no-op.
    pub async fn init(&self) -> Result<()> {
        let op_timeout = self.options.op_timeout;
        self.repo
            .get_or_try_init(|| async {
                let repo = with_timeout(op_timeout, self.backend.open()).await?;
                info!(backend = repo.name(), "Image store ready");
                Ok::<_, CacheError>(repo)
            })
            .await?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.repo.initialized()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn repo(&self) -> Result<&Arc<dyn ImageRepository>> {
        self.repo.get().ok_or_else(|| {
            CacheError::StorageUnavailable("image store is not initialized".to_string())
        })
    }

    async fn guarded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        with_timeout(self.options.op_timeout, fut).await
    }

    fn retention_ms(&self) -> u64 {
        self.options.retention.as_millis() as u64
    }

    fn is_live(&self, image: &CachedImage, now_ms: u64) -> bool {
        !image.is_expired(now_ms, self.retention_ms())
    }

    // == Validate ==
    /// Rejects non-image MIME types and files above the size cap.
    pub fn validate(&self, upload: &ImageUpload) -> Result<()> {
        if upload.size() > self.options.max_file_size {
            return Err(CacheError::Validation(format!(
                "File size {} exceeds limit of {} bytes",
                upload.size(),
                self.options.max_file_size
            )));
        }

        if !upload.file_type.starts_with(IMAGE_MIME_PREFIX) {
            return Err(CacheError::Validation(format!(
                "File must be an image, got '{}'",
                upload.file_type
            )));
        }

        Ok(())
    }

    // == Cache ==
    /// Stores an image and returns its fresh id.
    ///
    /// Identical content cached twice gets two ids. After a successful write
    /// the expiry sweep runs; its failure is logged and never fails the call.
    ///
    /// A write that outlives the storage timeout is abandoned, not rolled
    /// back: the caller sees `StorageUnavailable` but the backend may still
    /// commit the row. Such an orphan is unreachable by id and is removed by
    /// the sweep once it expires.
    pub async fn cache(&self, upload: ImageUpload) -> Result<String> {
        self.validate(&upload)?;
        let repo = self.repo()?;

        let now = self.clock.now_ms();
        let id = generate_image_id(now);
        let image = CachedImage::from_upload(id.clone(), &upload, now);

        self.guarded(repo.insert(image)).await?;
        info!(
            id = %id,
            file_name = %upload.file_name,
            file_size = upload.size(),
            "Image cached"
        );

        if let Err(e) = self.sweep_expired().await {
            warn!(error = %e, "Expiry sweep after insert failed");
        }

        Ok(id)
    }

    // == Get ==
    /// Returns the entry when present and not expired.
    ///
    /// An expired entry is reported absent but left in place for the sweep.
    pub async fn get(&self, id: &str) -> Result<Option<CachedImage>> {
        let repo = self.repo()?;
        let found = self.guarded(repo.get(id)).await?;
        let now = self.clock.now_ms();
        Ok(found.filter(|image| self.is_live(image, now)))
    }

    /// Base64 content without the data-URI prefix, ready for a JSON body.
    pub async fn get_encoded_payload(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .get(id)
            .await?
            .map(|image| image.encoded_payload().to_string()))
    }

    /// Decoded image bytes together with their MIME type.
    pub async fn get_bytes(&self, id: &str) -> Result<Option<(String, Vec<u8>)>> {
        let Some(image) = self.get(id).await? else {
            return Ok(None);
        };
        let bytes = image.decode_bytes().map_err(|e| {
            CacheError::Internal(format!("stored content for {} is not valid base64: {}", id, e))
        })?;
        Ok(Some((image.file_type, bytes)))
    }

    // == Remove ==
    /// Deletes an entry. Removing an absent id succeeds.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let repo = self.repo()?;
        let existed = self.guarded(repo.remove(id)).await?;
        debug!(id = %id, existed, "Image removed");
        Ok(())
    }

    // == List All ==
    /// All non-expired entries, in no particular order.
    pub async fn list_all(&self) -> Result<Vec<CachedImage>> {
        let repo = self.repo()?;
        let images = self.guarded(repo.list()).await?;
        let now = self.clock.now_ms();
        Ok(images
            .into_iter()
            .filter(|image| self.is_live(image, now))
            .collect())
    }

    // == Clear All ==
    /// Removes every entry, expired or not.
    pub async fn clear_all(&self) -> Result<()> {
        let repo = self.repo()?;
        let removed = self.guarded(repo.clear()).await?;
        info!(removed, "Image cache cleared");
        Ok(())
    }

    // == Size ==
    /// Count and byte total over live entries.
    pub async fn size(&self) -> Result<CacheSize> {
        Ok(self.list_all().await?.iter().collect())
    }

    // == Sweep Expired ==
    /// Physically deletes expired entries and returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let repo = self.repo()?;
        let Some(cutoff) = self.clock.now_ms().checked_sub(self.retention_ms()) else {
            return Ok(0);
        };

        let removed = self.guarded(repo.remove_created_before(cutoff)).await?;
        if removed > 0 {
            info!(removed, "Swept expired images");
        } else {
            debug!("Expiry sweep: nothing to remove");
        }
        Ok(removed)
    }
}

async fn with_timeout<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::StorageUnavailable(format!(
            "storage did not respond within {} ms",
            limit.as_millis()
        ))),
    }
}
