use thiserror::Error;

/// Failure reported by a store. Surfaces unchanged through the auth path.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
