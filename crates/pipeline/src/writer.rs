//! Artifact persistence saga.
//!
//! Each photo produces four writes: original upload, display upload,
//! thumbnail upload, catalog insert. A failure at any step deletes every
//! artifact written so far, so partial photos are never visible.

use gala_core::sniff::ImageKind;
use gala_core::types::DbId;
use gala_db::models::photo::{CreatePhoto, Photo};
use gala_storage::ObjectStore;

use crate::error::EntryFailure;
use crate::ledger::PhotoLedger;
use crate::transform::TransformedImage;

/// Content type of both derived renditions.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Storage keys for one photo's three artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub original: String,
    pub display: String,
    pub thumbnail: String,
}

/// Derive the three storage keys for a photo.
pub fn artifact_paths(event_id: DbId, photo_key: &str, kind: ImageKind) -> ArtifactPaths {
    ArtifactPaths {
        original: format!("originals/{event_id}/{photo_key}.{}", kind.extension()),
        display: format!("derived/{event_id}/{photo_key}_display.jpg"),
        thumbnail: format!("derived/{event_id}/{photo_key}_thumb.jpg"),
    }
}

/// Writes a photo's artifacts and catalog row transactionally-ish:
/// either all four writes land or none of the storage objects survive.
pub struct ArtifactWriter<'a> {
    storage: &'a dyn ObjectStore,
    photos: &'a dyn PhotoLedger,
    media_bucket: &'a str,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(
        storage: &'a dyn ObjectStore,
        photos: &'a dyn PhotoLedger,
        media_bucket: &'a str,
    ) -> Self {
        Self {
            storage,
            photos,
            media_bucket,
        }
    }

    /// Store one processed photo.
    ///
    /// Upload order: original, display, thumbnail, then the catalog
    /// insert. On failure the already-written objects are deleted
    /// (best-effort) before the entry failure is returned.
    pub async fn store_photo(
        &self,
        event_id: DbId,
        file_name: &str,
        kind: ImageKind,
        original_bytes: Vec<u8>,
        transformed: &TransformedImage,
    ) -> Result<Photo, EntryFailure> {
        let photo_key = uuid::Uuid::now_v7().to_string();
        let paths = artifact_paths(event_id, &photo_key, kind);
        let size_bytes = original_bytes.len() as i64;

        self.storage
            .put(
                self.media_bucket,
                &paths.original,
                original_bytes,
                kind.content_type(),
            )
            .await
            .map_err(|e| EntryFailure::Upload(e.to_string()))?;

        if let Err(e) = self
            .storage
            .put(
                self.media_bucket,
                &paths.display,
                transformed.display_bytes.clone(),
                JPEG_CONTENT_TYPE,
            )
            .await
        {
            self.rollback(&[&paths.original]).await;
            return Err(EntryFailure::Upload(e.to_string()));
        }

        if let Err(e) = self
            .storage
            .put(
                self.media_bucket,
                &paths.thumbnail,
                transformed.thumbnail_bytes.clone(),
                JPEG_CONTENT_TYPE,
            )
            .await
        {
            self.rollback(&[&paths.original, &paths.display]).await;
            return Err(EntryFailure::Upload(e.to_string()));
        }

        let input = CreatePhoto {
            event_id,
            original_path: paths.original.clone(),
            display_path: paths.display.clone(),
            thumbnail_path: paths.thumbnail.clone(),
            file_name: file_name.to_string(),
            size_bytes,
            width: transformed.width as i32,
            height: transformed.height as i32,
        };

        match self.photos.insert(&input).await {
            Ok(photo) => Ok(photo),
            Err(e) => {
                self.rollback(&[&paths.original, &paths.display, &paths.thumbnail])
                    .await;
                Err(EntryFailure::Catalog(e.to_string()))
            }
        }
    }

    /// Best-effort compensating deletes.
    async fn rollback(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.storage.delete(self.media_bucket, key).await {
                tracing::warn!(key, error = %e, "Saga rollback delete failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gala_storage::{MemoryStore, StorageError};

    use crate::memory::MemoryLedger;

    fn transformed() -> TransformedImage {
        TransformedImage {
            display_bytes: vec![1, 2, 3],
            thumbnail_bytes: vec![4, 5],
            width: 640,
            height: 480,
        }
    }

    /// Store wrapper that fails `put` for keys containing a marker.
    struct FailingPut {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    #[async_trait]
    impl ObjectStore for FailingPut {
        async fn head(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError> {
            self.inner.head(bucket, key).await
        }

        async fn put(
            &self,
            bucket: &str,
            key: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            if key.contains(self.fail_on) {
                return Err(StorageError::Provider("injected failure".into()));
            }
            self.inner.put(bucket, key, bytes, content_type).await
        }

        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.inner.get(bucket, key).await
        }

        async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
            self.inner.delete(bucket, key).await
        }
    }

    /// Ledger that rejects every insert.
    struct RejectingCatalog;

    #[async_trait]
    impl PhotoLedger for RejectingCatalog {
        async fn insert(&self, _input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    #[test]
    fn test_artifact_paths_layout() {
        let paths = artifact_paths(42, "abc", ImageKind::Png);
        assert_eq!(paths.original, "originals/42/abc.png");
        assert_eq!(paths.display, "derived/42/abc_display.jpg");
        assert_eq!(paths.thumbnail, "derived/42/abc_thumb.jpg");
    }

    #[tokio::test]
    async fn full_success_writes_three_objects_and_one_row() {
        let store = MemoryStore::new();
        let ledger = MemoryLedger::new();
        let writer = ArtifactWriter::new(&store, &ledger, "media");

        let photo = writer
            .store_photo(5, "party.jpg", ImageKind::Jpeg, vec![0xFF, 0xD8], &transformed())
            .await
            .unwrap();

        assert_eq!(store.object_count().await, 3);
        assert!(store.contains("media", &photo.original_path).await);
        assert_eq!(
            store.content_type_of("media", &photo.original_path).await.as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(photo.file_name, "party.jpg");
        assert_eq!(photo.size_bytes, 2);
        assert_eq!((photo.width, photo.height), (640, 480));
        assert_eq!(ledger.photo_count().await, 1);
    }

    #[tokio::test]
    async fn display_failure_rolls_back_original() {
        let store = FailingPut {
            inner: MemoryStore::new(),
            fail_on: "_display",
        };
        let ledger = MemoryLedger::new();
        let writer = ArtifactWriter::new(&store, &ledger, "media");

        let err = writer
            .store_photo(5, "party.jpg", ImageKind::Jpeg, vec![1], &transformed())
            .await
            .unwrap_err();

        assert!(matches!(err, EntryFailure::Upload(_)));
        assert_eq!(store.inner.object_count().await, 0);
        assert_eq!(ledger.photo_count().await, 0);
    }

    #[tokio::test]
    async fn thumbnail_failure_rolls_back_both_uploads() {
        let store = FailingPut {
            inner: MemoryStore::new(),
            fail_on: "_thumb",
        };
        let ledger = MemoryLedger::new();
        let writer = ArtifactWriter::new(&store, &ledger, "media");

        let err = writer
            .store_photo(5, "party.jpg", ImageKind::Jpeg, vec![1], &transformed())
            .await
            .unwrap_err();

        assert!(matches!(err, EntryFailure::Upload(_)));
        assert_eq!(store.inner.object_count().await, 0);
    }

    #[tokio::test]
    async fn catalog_failure_rolls_back_all_three_objects() {
        let store = MemoryStore::new();
        let writer = ArtifactWriter::new(&store, &RejectingCatalog, "media");

        let err = writer
            .store_photo(5, "party.jpg", ImageKind::Jpeg, vec![1], &transformed())
            .await
            .unwrap_err();

        assert!(matches!(err, EntryFailure::Catalog(_)));
        assert_eq!(store.object_count().await, 0);
    }
}
