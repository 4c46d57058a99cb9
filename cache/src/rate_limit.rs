//! Fixed-window request counters keyed by scope, client address and path.

use std::time::Duration;

use crate::error::StoreResult;
use crate::tokens::{RATE_LIMIT_PREFIX, TokenManager, ceil_secs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub scope: &'static str,
    pub window: Duration,
    pub max_requests: i64,
    pub message: &'static str,
}

impl RateLimitPolicy {
    pub const fn attendance() -> Self {
        Self {
            scope: "attendance",
            window: Duration::from_secs(60),
            max_requests: 5,
            message: "Too many attendance attempts. Please wait a minute.",
        }
    }

    pub const fn api() -> Self {
        Self {
            scope: "api",
            window: Duration::from_secs(60),
            max_requests: 60,
            message: "Too many requests. Please slow down.",
        }
    }

    pub const fn auth() -> Self {
        Self {
            scope: "auth",
            window: Duration::from_secs(15 * 60),
            max_requests: 10,
            message: "Too many authentication attempts. Try again later.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub limit: i64,
    pub count: i64,
    pub remaining: i64,
    /// Whole seconds until the window resets.
    pub reset_after: u64,
    pub limited: bool,
}

impl TokenManager {
    /// Counts one request against `policy`. The first hit in a window starts the
    /// window expiry. Callers treat `Err` as "allow".
    pub async fn hit_rate_limit(
        &self,
        policy: &RateLimitPolicy,
        client: &str,
        path: &str,
    ) -> StoreResult<RateDecision> {
        let key = format!("{RATE_LIMIT_PREFIX}{}:{client}:{path}", policy.scope);
        let store = self.store();

        let count = store.incr(&key).await?;
        if count == 1 {
            store.expire(&key, policy.window).await?;
        }

        let reset_after = match store.ttl(&key).await? {
            Some(ttl) => ceil_secs(ttl),
            None => {
                // counter lost its expiry (e.g. expire failed on a previous hit)
                store.expire(&key, policy.window).await?;
                policy.window.as_secs()
            }
        };

        Ok(RateDecision {
            limit: policy.max_requests,
            count,
            remaining: (policy.max_requests - count).max(0),
            reset_after,
            limited: count > policy.max_requests,
        })
    }
}
