/// Errors surfaced by an [`ObjectStore`](crate::ObjectStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Any other backend failure, with the provider's message.
    #[error("Storage provider error: {0}")]
    Provider(String),
}
