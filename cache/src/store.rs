use async_trait::async_trait;
use std::time::Duration;

use crate::error::StoreResult;

/// The primitives the attendance core needs from a low-latency key-value store.
///
/// Mirrors a subset of Redis: `EXISTS`, `GET`, `SET [EX]`, `SET EX NX`, `DEL`,
/// `INCR`, `EXPIRE`/`PEXPIRE` and `PTTL`. `keys`, `flush` and `ping` exist for the
/// admin surface and health checks only and are never used on the marking path.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// `SET key value [EX ttl]`. Overwrites any existing value and expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// `SET key value EX ttl NX`. Returns `true` when the key was written.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Returns `true` when a key was removed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Returns `true` when the key existed and the expiry was applied.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remaining time to live. `None` when the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Keys matching a glob pattern (only `*` wildcards are used by callers).
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    async fn flush(&self) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}
