//! AWS S3 implementation of [`ObjectStore`].

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::StorageError;
use crate::provider::ObjectStore;

/// S3-backed object store.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Build a store from the ambient AWS configuration (environment,
    /// profile, or instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    /// Build a store from an explicit SDK client (custom endpoint, tests
    /// against MinIO, etc.).
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(output.content_length().map(|len| len.max(0) as u64)),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                {
                    Ok(None)
                } else {
                    Err(StorageError::Provider(err.to_string()))
                }
            }
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        tracing::debug!(bucket, key, "Uploaded object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::Provider(err.to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Provider(err.to_string()))?;
        tracing::debug!(bucket, key, "Deleted object");
        Ok(())
    }
}
