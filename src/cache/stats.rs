//! Cache Size Module
//!
//! Aggregate over the live (non-expired) cached images.

use serde::Serialize;

use crate::cache::CachedImage;

// == Cache Size ==
/// Count and total byte size of live entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheSize {
    /// Number of live entries
    pub count: usize,
    /// Sum of `file_size` over live entries
    pub total_bytes: u64,
}

impl CacheSize {
    // == Constructor ==
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one entry to the aggregate.
    pub fn record(&mut self, file_size: u64) {
        self.count += 1;
        self.total_bytes += file_size;
    }
}

impl<'a> FromIterator<&'a CachedImage> for CacheSize {
    fn from_iter<I: IntoIterator<Item = &'a CachedImage>>(iter: I) -> Self {
        let mut size = CacheSize::new();
        for image in iter {
            size.record(image.file_size);
        }
        size
    }
}
