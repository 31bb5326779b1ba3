use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-level failures. Rows that simply do not exist come back as
/// `Ok(None)` or an empty list, never as an error; the API layer decides
/// what missing data means for a given request.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The (liker, liked) edge already exists. Likes are immutable, so a
    /// repeat is always a caller mistake rather than an update.
    #[error("user {liker_id} already liked user {liked_id}")]
    DuplicateLike { liker_id: i64, liked_id: i64 },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored value malformed: {0}")]
    Encoding(#[from] serde_json::Error),
}
