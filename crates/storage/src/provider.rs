//! The [`ObjectStore`] trait — low-level object operations implemented by
//! each backend.

use async_trait::async_trait;

use crate::error::StorageError;

/// Low-level object storage operations.
///
/// Implementations must be cheap to share behind an `Arc`; the pipeline
/// holds one for the lifetime of an invocation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists and return its size in bytes.
    ///
    /// Returns `Ok(None)` when the object does not exist. Used for the
    /// pre-download archive size check.
    async fn head(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError>;

    /// Upload bytes under the given key with a content type.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Download an object fully into memory.
    ///
    /// Returns [`StorageError::NotFound`] when the object does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
