//! Error types for storage operations.

use thiserror::Error;

/// Error type for key-value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage failure (I/O, platform bridge, remote store).
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// A value could not be serialized before writing.
    ///
    /// Deserialization failures never surface here: corrupt stored values
    /// degrade to `None` on read.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Wraps an arbitrary backend failure.
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(error))
    }
}
