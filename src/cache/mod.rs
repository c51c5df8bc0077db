//! Cache Module
//!
//! Local image cache with a fixed retention window and a per-item type/size policy.

mod clock;
mod entry;
mod repository;
mod sqlite;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{generate_image_id, strip_data_url_prefix, to_data_url, CachedImage, ImageUpload};
pub use repository::{ImageRepository, MemoryRepository};
pub use sqlite::SqliteRepository;
pub use stats::CacheSize;
pub use store::{Backend, ImageCacheStore, StoreOptions};

// == Public Constants ==
/// Maximum accepted file size in bytes (inclusive)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10 MiB

/// Default retention window in seconds
pub const DEFAULT_RETENTION_SECS: u64 = 24 * 60 * 60;

/// Every cached MIME type starts with this
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Prefix of generated image ids
pub const ID_PREFIX: &str = "img_";
