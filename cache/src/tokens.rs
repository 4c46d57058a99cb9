//! Token/cooldown manager: owns every ephemeral key schema used by attendance.
//!
//! | key                                   | value              | ttl                  |
//! |---------------------------------------|--------------------|----------------------|
//! | `token:cooldown:{student}`            | [`CooldownState`]  | cooldown window      |
//! | `session:{code}`                      | [`SessionSnapshot`]| remaining validity   |
//! | `attendance:count:{session}`          | integer            | 24h, refreshed       |
//! | `device:lock:{student}`               | fingerprint        | none                 |
//! | `scan:lock:{student}`                 | `1`                | scan lock seconds    |
//! | `scan:dedup:{student}:{code}`         | `1`                | dedup seconds        |
//!
//! Store failures are handled per operation. Checks that gate a scan fail closed,
//! advisory and UX helpers fail open, and writes surface the error to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::EphemeralStore;

pub const COOLDOWN_PREFIX: &str = "token:cooldown:";
pub const SESSION_PREFIX: &str = "session:";
pub const COUNT_PREFIX: &str = "attendance:count:";
pub const DEVICE_PREFIX: &str = "device:lock:";
pub const SCAN_LOCK_PREFIX: &str = "scan:lock:";
pub const DEDUP_PREFIX: &str = "scan:dedup:";
pub const RATE_LIMIT_PREFIX: &str = "rl:";

#[derive(Debug, Clone, Copy)]
pub struct TokenSettings {
    pub cooldown: Duration,
    pub scan_lock: Duration,
    pub dedup: Duration,
    pub counter_ttl: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60 * 60),
            scan_lock: Duration::from_secs(10),
            dedup: Duration::from_secs(5),
            counter_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Value stored under the cooldown key once a scan has been consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownState {
    pub session_id: i64,
    pub fingerprint: String,
    pub used_at: DateTime<Utc>,
}

/// Denormalized, non-authoritative copy of a session kept in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: i64,
    pub teacher_id: i64,
    pub code: String,
    pub subject: String,
    pub department: String,
    pub year: Option<i32>,
    pub section: Option<String>,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }
}

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn EphemeralStore>,
    settings: TokenSettings,
}

pub(crate) fn ceil_secs(d: Duration) -> u64 {
    d.as_millis().div_ceil(1000) as u64
}

impl TokenManager {
    pub fn new(store: Arc<dyn EphemeralStore>, settings: TokenSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn EphemeralStore> {
        &self.store
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub(crate) fn cooldown_key(student_id: i64) -> String {
        format!("{COOLDOWN_PREFIX}{student_id}")
    }

    pub(crate) fn session_key(code: &str) -> String {
        format!("{SESSION_PREFIX}{code}")
    }

    pub(crate) fn count_key(session_id: i64) -> String {
        format!("{COUNT_PREFIX}{session_id}")
    }

    pub(crate) fn scan_lock_key(student_id: i64) -> String {
        format!("{SCAN_LOCK_PREFIX}{student_id}")
    }

    pub(crate) fn dedup_key(student_id: i64, session_code: &str) -> String {
        format!("{DEDUP_PREFIX}{student_id}:{session_code}")
    }

    // --- Cooldown ---

    /// `Err` when the store cannot confirm availability.
    pub async fn try_has_available_token(&self, student_id: i64) -> StoreResult<bool> {
        let exists = self.store.exists(&Self::cooldown_key(student_id)).await?;
        Ok(!exists)
    }

    /// Fail-closed: an unreachable store reports no available token.
    pub async fn has_available_token(&self, student_id: i64) -> bool {
        self.try_has_available_token(student_id)
            .await
            .unwrap_or_else(|e| {
                warn!(student_id, error = %e, "Token check failed; denying scan");
                false
            })
    }

    /// Starts a fresh full cooldown window. Call once per successful mark.
    pub async fn consume_token(
        &self,
        student_id: i64,
        session_id: i64,
        fingerprint: &str,
    ) -> StoreResult<()> {
        let state = CooldownState {
            session_id,
            fingerprint: fingerprint.to_owned(),
            used_at: Utc::now(),
        };
        let value = serde_json::to_string(&state)?;

        self.store
            .set(
                &Self::cooldown_key(student_id),
                &value,
                Some(self.settings.cooldown),
            )
            .await
    }

    pub async fn cooldown_state(&self, student_id: i64) -> StoreResult<Option<CooldownState>> {
        match self.store.get(&Self::cooldown_key(student_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Remaining cooldown in whole seconds (rounded up), or 0.
    pub async fn cooldown_remaining(&self, student_id: i64) -> u64 {
        match self.store.ttl(&Self::cooldown_key(student_id)).await {
            Ok(ttl) => ttl.map(ceil_secs).unwrap_or(0),
            Err(e) => {
                warn!(student_id, error = %e, "Cooldown lookup failed");
                0
            }
        }
    }

    pub async fn reset_cooldown(&self, student_id: i64) -> StoreResult<bool> {
        self.store.del(&Self::cooldown_key(student_id)).await
    }

    // --- Session cache ---

    pub async fn cache_session(&self, snapshot: &SessionSnapshot, ttl: Duration) -> StoreResult<()> {
        let value = serde_json::to_string(snapshot)?;
        self.store
            .set(&Self::session_key(&snapshot.code), &value, Some(ttl))
            .await
    }

    pub async fn cached_session(&self, code: &str) -> StoreResult<Option<SessionSnapshot>> {
        match self.store.get(&Self::session_key(code)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn invalidate_session(&self, code: &str) -> StoreResult<bool> {
        self.store.del(&Self::session_key(code)).await
    }

    // --- Advisory counters ---

    pub async fn increment_attendance_count(&self, session_id: i64) -> StoreResult<i64> {
        let key = Self::count_key(session_id);
        let count = self.store.incr(&key).await?;
        self.store.expire(&key, self.settings.counter_ttl).await?;
        Ok(count)
    }

    pub async fn attendance_count(&self, session_id: i64) -> i64 {
        match self.store.get(&Self::count_key(session_id)).await {
            Ok(raw) => raw.and_then(|v| v.parse().ok()).unwrap_or(0),
            Err(e) => {
                warn!(session_id, error = %e, "Attendance counter lookup failed");
                0
            }
        }
    }

    // --- Mutual exclusion ---

    pub async fn acquire_scan_lock(&self, student_id: i64) -> StoreResult<bool> {
        self.store
            .set_nx(&Self::scan_lock_key(student_id), "1", self.settings.scan_lock)
            .await
    }

    pub async fn release_scan_lock(&self, student_id: i64) -> StoreResult<bool> {
        self.store.del(&Self::scan_lock_key(student_id)).await
    }

    /// Acquires the scan lock and wraps it in a guard. `Ok(None)` means another
    /// scan for the same student is in flight.
    pub async fn lock_scan(&self, student_id: i64) -> StoreResult<Option<ScanLock>> {
        if !self.acquire_scan_lock(student_id).await? {
            return Ok(None);
        }
        Ok(Some(ScanLock {
            tokens: self.clone(),
            student_id,
            released: false,
        }))
    }

    /// Fail-open: a store error lets the request through, since the durable
    /// uniqueness constraint is the real backstop.
    pub async fn is_duplicate_request(&self, student_id: i64, session_code: &str) -> bool {
        let key = Self::dedup_key(student_id, session_code);
        match self.store.set_nx(&key, "1", self.settings.dedup).await {
            Ok(written) => !written,
            Err(e) => {
                warn!(student_id, error = %e, "Dedup check failed; allowing request");
                false
            }
        }
    }
}

/// Held scan lock. Release it with [`ScanLock::release`]; if the guard is dropped
/// instead (cancelled request, panic) the release is spawned on the runtime and
/// the key TTL remains the last resort.
pub struct ScanLock {
    tokens: TokenManager,
    student_id: i64,
    released: bool,
}

impl ScanLock {
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.tokens.release_scan_lock(self.student_id).await {
            warn!(student_id = self.student_id, error = %e, "Failed to release scan lock");
        }
    }
}

impl Drop for ScanLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let tokens = self.tokens.clone();
        let student_id = self.student_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = tokens.release_scan_lock(student_id).await {
                        warn!(student_id, error = %e, "Deferred scan lock release failed");
                    }
                });
            }
            Err(_) => debug!(student_id, "No runtime to release scan lock; relying on TTL"),
        }
    }
}
