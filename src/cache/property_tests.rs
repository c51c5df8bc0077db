//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's behavior over generated inputs.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    Backend, CacheSize, ImageCacheStore, ImageUpload, ManualClock, MemoryRepository,
    StoreOptions,
};

// == Test Configuration ==
const T0: u64 = 1_700_000_000_000;
const RETENTION_MS: u64 = 24 * 60 * 60 * 1000;
/// Small cap so generated uploads straddle the limit cheaply.
const TEST_MAX_FILE_SIZE: usize = 2048;

fn options() -> StoreOptions {
    StoreOptions {
        retention: Duration::from_millis(RETENTION_MS),
        max_file_size: TEST_MAX_FILE_SIZE,
        op_timeout: Duration::from_secs(5),
    }
}

fn store_at(clock: Arc<ManualClock>) -> ImageCacheStore {
    let store = ImageCacheStore::new(Backend::Memory, options()).with_clock(clock);
    tokio_test::block_on(store.init()).unwrap();
    store
}

// == Strategies ==
fn image_mime_strategy() -> impl Strategy<Value = String> {
    "(png|jpeg|gif|webp|svg\\+xml)".prop_map(|sub| format!("image/{}", sub))
}

fn non_image_mime_strategy() -> impl Strategy<Value = String> {
    "(text|application|video|audio)/[a-z]{1,8}"
}

fn file_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,24}\\.(png|jpg|gif)"
}

fn valid_upload_strategy() -> impl Strategy<Value = ImageUpload> {
    (
        file_name_strategy(),
        image_mime_strategy(),
        prop::collection::vec(any::<u8>(), 0..=TEST_MAX_FILE_SIZE),
    )
        .prop_map(|(name, mime, bytes)| ImageUpload::new(name, mime, bytes))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Removing twice leaves the store exactly as removing once.
    #[test]
    fn prop_remove_is_idempotent(uploads in prop::collection::vec(valid_upload_strategy(), 1..6), pick in any::<prop::sample::Index>()) {
        let store = store_at(Arc::new(ManualClock::new(T0)));
        tokio_test::block_on(async {
            let mut ids = Vec::new();
            for upload in uploads {
                ids.push(store.cache(upload).await.unwrap());
            }
            let target = pick.get(&ids).clone();

            store.remove(&target).await.unwrap();
            let once = store.size().await.unwrap();

            store.remove(&target).await.unwrap();
            let twice = store.size().await.unwrap();

            prop_assert_eq!(once, twice);
            prop_assert_eq!(once.count, ids.len() - 1);
            prop_assert!(store.get(&target).await.unwrap().is_none());
            Ok(())
        })?;
    }

    // Visible strictly before T + retention, absent from T + retention on,
    // no matter how often it was read in between.
    #[test]
    fn prop_expiry_monotonicity(offsets in prop::collection::vec(0u64..RETENTION_MS * 2, 1..20)) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = store_at(clock.clone());
        tokio_test::block_on(async {
            let id = store.cache(ImageUpload::new("a.png", "image/png", vec![1, 2, 3])).await.unwrap();

            for offset in offsets {
                clock.set(T0 + offset);
                let visible = store.get(&id).await.unwrap().is_some();
                prop_assert_eq!(visible, offset < RETENTION_MS, "offset {}", offset);
            }
            Ok(())
        })?;
    }

    // Non-image types never get stored.
    #[test]
    fn prop_rejects_non_image_types(mime in non_image_mime_strategy(), bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let store = store_at(Arc::new(ManualClock::new(T0)));
        tokio_test::block_on(async {
            prop_assert!(store.cache(ImageUpload::new("f.bin", mime, bytes)).await.is_err());
            prop_assert!(store.list_all().await.unwrap().is_empty());
            Ok(())
        })?;
    }

    // Sizes at or under the cap are accepted, anything above is rejected and not stored.
    #[test]
    fn prop_size_gate(len in (TEST_MAX_FILE_SIZE - 8)..(TEST_MAX_FILE_SIZE + 8)) {
        let store = store_at(Arc::new(ManualClock::new(T0)));
        tokio_test::block_on(async {
            let result = store.cache(ImageUpload::new("f.png", "image/png", vec![0u8; len])).await;
            prop_assert_eq!(result.is_ok(), len <= TEST_MAX_FILE_SIZE);
            prop_assert_eq!(store.list_all().await.unwrap().len(), usize::from(len <= TEST_MAX_FILE_SIZE));
            Ok(())
        })?;
    }

    // Cached bytes, type and name come back unchanged.
    #[test]
    fn prop_roundtrip_fidelity(upload in valid_upload_strategy()) {
        let store = store_at(Arc::new(ManualClock::new(T0)));
        tokio_test::block_on(async {
            let id = store.cache(upload.clone()).await.unwrap();
            let image = store.get(&id).await.unwrap().unwrap();

            prop_assert_eq!(image.decode_bytes().unwrap(), upload.bytes.clone());
            prop_assert_eq!(&image.file_type, &upload.file_type);
            prop_assert_eq!(&image.file_name, &upload.file_name);
            prop_assert_eq!(image.file_size, upload.size() as u64);
            Ok(())
        })?;
    }

    // size() matches the inserted count and byte sum.
    #[test]
    fn prop_aggregate_consistency(uploads in prop::collection::vec(valid_upload_strategy(), 0..8)) {
        let store = store_at(Arc::new(ManualClock::new(T0)));
        tokio_test::block_on(async {
            let expected = CacheSize {
                count: uploads.len(),
                total_bytes: uploads.iter().map(|u| u.size() as u64).sum(),
            };
            for upload in uploads {
                store.cache(upload).await.unwrap();
            }
            prop_assert_eq!(store.size().await.unwrap(), expected);
            Ok(())
        })?;
    }

    // clear_all empties the store, expired rows included.
    #[test]
    fn prop_clear_all_completeness(
        uploads in prop::collection::vec(valid_upload_strategy(), 0..8),
        age in 0u64..RETENTION_MS * 3,
    ) {
        let clock = Arc::new(ManualClock::new(T0));
        let repo = Arc::new(MemoryRepository::new());
        let store = ImageCacheStore::new(Backend::Custom(repo.clone()), options())
            .with_clock(clock.clone());
        tokio_test::block_on(async {
            use crate::cache::ImageRepository;

            store.init().await.unwrap();
            for upload in uploads {
                store.cache(upload).await.unwrap();
            }
            clock.advance_ms(age);

            store.clear_all().await.unwrap();
            prop_assert!(store.list_all().await.unwrap().is_empty());
            prop_assert_eq!(store.size().await.unwrap(), CacheSize::default());
            prop_assert!(repo.list().await.unwrap().is_empty());
            Ok(())
        })?;
    }
}
