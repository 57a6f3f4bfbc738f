use thoughtlocker::LoadError;

/// Errors specific to store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("prompt spec not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("store is closed")]
    Closed,
}
