use std::time::Duration;

/// Errors raised by the ephemeral coordination store.
///
/// Every variant is treated as "store unavailable" by callers; the fail-open or
/// fail-closed decision is made per operation in [`crate::tokens::TokenManager`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Ephemeral store is not connected")]
    NotConnected,

    #[error("Ephemeral store command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Malformed cached value: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
