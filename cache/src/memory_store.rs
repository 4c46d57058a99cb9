//! In-process [`EphemeralStore`] used by tests and single-node development runs.
//!
//! Expiry uses `tokio::time::Instant`, so tests can drive TTLs with
//! `tokio::time::pause()` / `advance()`. `set_available(false)` simulates an
//! outage: every command then fails with [`StoreError::NotConnected`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};
use crate::store::EphemeralStore;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Runs `op` against the live entries, evicting the key first if it expired.
    fn with_entries<T>(
        &self,
        key: Option<&str>,
        op: impl FnOnce(&mut HashMap<String, Entry>, Instant) -> T,
    ) -> StoreResult<T> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::NotConnected);
        }

        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match key {
            Some(key) => {
                if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                    entries.remove(key);
                }
            }
            None => entries.retain(|_, e| e.is_live(now)),
        }

        Ok(op(&mut entries, now))
    }
}

/// Glob match supporting `*` only, which is all the admin surface uses.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == candidate;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !candidate.starts_with(first) || !candidate[first.len()..].ends_with(last) {
        return false;
    }

    let mut rest = &candidate[first.len()..candidate.len() - last.len()];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(i) => rest = &rest[i + middle.len()..],
            None => return false,
        }
    }
    true
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.with_entries(Some(key), |entries, _| entries.contains_key(key))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_entries(Some(key), |entries, _| {
            entries.get(key).map(|e| e.value.clone())
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.with_entries(Some(key), |entries, now| {
            entries.insert(
                key.to_owned(),
                Entry {
                    value: value.to_owned(),
                    expires_at: ttl.map(|ttl| now + ttl),
                },
            );
        })
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        self.with_entries(Some(key), |entries, now| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_owned(),
                Entry {
                    value: value.to_owned(),
                    expires_at: Some(now + ttl),
                },
            );
            true
        })
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.with_entries(Some(key), |entries, _| entries.remove(key).is_some())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.with_entries(Some(key), |entries, _| {
            let entry = entries.entry(key.to_owned()).or_insert(Entry {
                value: "0".into(),
                expires_at: None,
            });
            let next = entry.value.parse::<i64>().unwrap_or(0) + 1;
            entry.value = next.to_string();
            next
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.with_entries(Some(key), |entries, now| match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            None => false,
        })
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.with_entries(Some(key), |entries, now| {
            entries
                .get(key)
                .and_then(|e| e.expires_at)
                .map(|at| at.saturating_duration_since(now))
        })
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.with_entries(None, |entries, _| {
            let mut keys: Vec<String> = entries
                .keys()
                .filter(|k| glob_match(pattern, k))
                .cloned()
                .collect();
            keys.sort();
            keys
        })
    }

    async fn flush(&self) -> StoreResult<()> {
        self.with_entries(None, |entries, _| entries.clear())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.with_entries(None, |_, _| ())
    }
}
