//! Redis-backed [`EphemeralStore`].
//!
//! The connection is a process-wide [`ConnectionManager`] created once at
//! startup. When Redis is unreachable at boot the store stays in a disconnected
//! state, every command fails fast with [`StoreError::NotConnected`], and a
//! background task keeps reconnecting with a capped linear backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisResult,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::RwLock;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::EphemeralStore;

const BACKOFF_STEP_MS: u64 = 500;
const BACKOFF_CAP_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub max_retries: u32,
}

#[derive(Clone)]
pub struct RedisStore {
    manager: Arc<RwLock<Option<ConnectionManager>>>,
    command_timeout: Duration,
}

/// Linear backoff capped at three seconds.
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_millis((u64::from(attempt) * BACKOFF_STEP_MS).min(BACKOFF_CAP_MS))
}

impl RedisStore {
    /// Connects to Redis, retrying up to `max_retries` times.
    ///
    /// Never hangs and never panics: if every attempt fails the returned store is
    /// disconnected and a reconnect loop is spawned on the current runtime.
    pub async fn connect(config: RedisConfig) -> Self {
        let store = Self {
            manager: Arc::new(RwLock::new(None)),
            command_timeout: config.command_timeout,
        };

        match Self::establish(&config).await {
            Ok(manager) => {
                *store.manager.write().await = Some(manager);
                info!("Redis connected");
            }
            Err(e) => {
                error!(error = %e, "Redis unavailable at startup; continuing disconnected");
                store.spawn_reconnect(config);
            }
        }

        store
    }

    pub async fn is_connected(&self) -> bool {
        self.manager.read().await.is_some()
    }

    async fn establish(config: &RedisConfig) -> StoreResult<ConnectionManager> {
        let client = Client::open(config.url.as_str())?;
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.max_retries as usize)
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.command_timeout);

        let max_attempts = config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let pending = client.get_connection_manager_with_config(manager_config.clone());

            let failure = match timeout(config.connect_timeout, pending).await {
                Ok(Ok(manager)) => return Ok(manager),
                Ok(Err(e)) => StoreError::from(e),
                Err(_) => StoreError::Timeout(config.connect_timeout),
            };

            if attempt >= max_attempts {
                return Err(failure);
            }

            let delay = backoff(attempt);
            warn!(attempt, ?delay, error = %failure, "Redis connection attempt failed");
            sleep(delay).await;
        }
    }

    fn spawn_reconnect(&self, config: RedisConfig) {
        let slot = self.manager.clone();

        tokio::spawn(async move {
            let mut round: u32 = 0;
            loop {
                round = round.saturating_add(1);
                sleep(backoff(round)).await;

                match Self::establish(&config).await {
                    Ok(manager) => {
                        *slot.write().await = Some(manager);
                        info!(round, "Redis reconnected");
                        break;
                    }
                    Err(e) => warn!(round, error = %e, "Redis still unavailable"),
                }
            }
        });
    }

    async fn run<T, F, Fut>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut + Send,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let conn = self
            .manager
            .read()
            .await
            .clone()
            .ok_or(StoreError::NotConnected)?;

        match timeout(self.command_timeout, op(conn)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout(self.command_timeout)),
        }
    }
}

fn whole_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl EphemeralStore for RedisStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.run(|mut conn| async move { conn.exists::<_, bool>(key).await })
            .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.run(|mut conn| async move {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl {
                cmd.arg("EX").arg(whole_seconds(ttl));
            }
            let reply: () = cmd.query_async(&mut conn).await?;
            Ok(reply)
        })
        .await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.run(|mut conn| async move {
            let reply: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(whole_seconds(ttl))
                .arg("NX")
                .query_async(&mut conn)
                .await?;
            Ok(reply.is_some())
        })
        .await
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.run(|mut conn| async move {
            let removed: i64 = conn.del(key).await?;
            Ok(removed > 0)
        })
        .await
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.run(|mut conn| async move { conn.incr::<_, _, i64>(key, 1).await })
            .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.run(|mut conn| async move {
            let applied: i64 = redis::cmd("PEXPIRE")
                .arg(key)
                .arg(ttl.as_millis() as u64)
                .query_async(&mut conn)
                .await?;
            Ok(applied == 1)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.run(|mut conn| async move {
            // -2: missing, -1: no expiry
            let millis: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
            Ok((millis > 0).then(|| Duration::from_millis(millis as u64)))
        })
        .await
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.run(|mut conn| async move { conn.keys::<_, Vec<String>>(pattern).await })
            .await
    }

    async fn flush(&self) -> StoreResult<()> {
        self.run(|mut conn| async move {
            let reply: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
            Ok(reply)
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run(|mut conn| async move {
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}
