//! Process-wide TTL cache.
//!
//! Entries expire lazily: nothing sweeps in the background, an expired entry
//! is dropped by the `get` that finds it. Each process owns its own cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;

/// Millisecond wall clock, injectable so tests control expiry.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_millis(i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1000));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Stores `value` for `ttl_secs`. Concurrent writers to one key: last wins.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_secs: u64) {
        let ttl_ms = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expires_at_ms = self.clock.now_millis().saturating_add(ttl_ms);
        self.entries.write().insert(
            key.into(),
            Entry {
                value,
                expires_at_ms,
            },
        );
    }

    /// The live value, or `None`. An expired entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(e) if now <= e.expires_at_ms => return Some(e.value.clone()),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write();
        // re-check: another writer may have refreshed it meanwhile
        match entries.get(key) {
            Some(e) if now <= e.expires_at_ms => Some(e.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let entries = self.entries.read();
        let valid = entries.values().filter(|e| now <= e.expires_at_ms).count();
        CacheStats {
            total: entries.len(),
            valid,
            expired: entries.len() - valid,
        }
    }
}
