//! In-memory cache backend implementation.

use super::CacheBackend;
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Writes between two sweeps of expired entries.
const SWEEP_INTERVAL: u64 = 256;

#[derive(Clone, Debug)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Resolve the expiry for a write. `None` keeps `previous`.
fn expiry_for(
    key: &str,
    ttl: Option<Duration>,
    previous: Option<Instant>,
    now: Instant,
) -> Result<Option<Instant>> {
    match ttl {
        None => Ok(previous),
        Some(d) if d.is_zero() => Ok(None),
        Some(d) => now.checked_add(d).map(Some).ok_or_else(|| {
            Error::InvalidValue(format!("invalid expire time {:?} for key {}", d, key))
        }),
    }
}

/// Parse a counter the way Redis does: an optional `-`, then digits with no
/// leading zero unless the value is exactly `0`.
fn parse_counter(key: &str, value: &str) -> Result<i64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let canonical = match digits.as_bytes() {
        [b'0'] => value == "0",
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };

    canonical
        .then(|| value.parse::<i64>().ok())
        .flatten()
        .ok_or_else(|| {
            Error::InvalidValue(format!(
                "value at key {} is not an integer or out of range",
                key
            ))
        })
}

fn overflow(key: &str) -> Error {
    Error::InvalidValue(format!(
        "increment or decrement would overflow for key {}",
        key
    ))
}

/// Process-local cache backend backed by a concurrent hash map.
///
/// Every read-modify-write runs while holding the map shard lock of its key,
/// which makes counter operations and [`decrease_and_delete`] atomic per key.
/// Expired entries are dropped when they are next touched, and the whole map
/// is swept every few hundred writes and on [`len`](InMemoryBackend::len).
/// Expiry follows the Tokio clock, so paused-time tests can advance it.
///
/// Cloning is cheap and clones share the same store.
///
/// [`decrease_and_delete`]: CacheBackend::decrease_and_delete
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
    closed: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl InMemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries. Expired entries are purged first.
    pub async fn len(&self) -> usize {
        self.purge_expired(Instant::now());
        self.store.len()
    }

    /// Whether the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn purge_expired(&self, now: Instant) {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.store.len());
        if purged > 0 {
            debug!("✓ InMemory purged {} expired entries", purged);
        }
    }

    /// Count a write and sweep expired entries every `SWEEP_INTERVAL` writes.
    ///
    /// Must not be called while holding a map guard.
    fn record_write(&self, now: Instant) {
        let count = self.writes.fetch_add(1, Ordering::Relaxed);
        if count % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.purge_expired(now);
        }
    }

    fn apply_delta(&self, key: &str, delta: i64) -> Result<i64> {
        self.ensure_open()?;
        let now = Instant::now();

        let value = match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let (current, expires_at) = if entry.is_expired(now) {
                    (0, None)
                } else {
                    (parse_counter(key, &entry.value)?, entry.expires_at)
                };
                let next = current.checked_add(delta).ok_or_else(|| overflow(key))?;
                *entry = CacheEntry {
                    value: next.to_string(),
                    expires_at,
                };
                next
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    value: delta.to_string(),
                    expires_at: None,
                });
                delta
            }
        };

        self.record_write(now);
        debug!("✓ InMemory INCRBY {} {} -> {}", key, delta, value);
        Ok(value)
    }
}

impl CacheBackend for InMemoryBackend {
    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }
        self.store.clear();
        info!("✓ InMemory backend closed - all entries dropped");
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        let now = Instant::now();

        let value = match self.store.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            _ => None,
        };
        if value.is_none() {
            // evict lazily; the guard from `get` is gone by now
            self.store.remove_if(key, |_, entry| entry.is_expired(now));
        }

        debug!(
            "✓ InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set_if_not_exists(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        self.ensure_open()?;
        let now = Instant::now();

        let created = match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(CacheEntry {
                        value: value.to_string(),
                        expires_at: expiry_for(key, ttl, None, now)?,
                    });
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    value: value.to_string(),
                    expires_at: expiry_for(key, ttl, None, now)?,
                });
                true
            }
        };

        self.record_write(now);
        debug!("✓ InMemory SETNX {} -> {}", key, created);
        Ok(created)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.ensure_open()?;
        let now = Instant::now();

        match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let previous = if entry.is_expired(now) {
                    None
                } else {
                    entry.expires_at
                };
                *entry = CacheEntry {
                    value: value.to_string(),
                    expires_at: expiry_for(key, ttl, previous, now)?,
                };
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    value: value.to_string(),
                    expires_at: expiry_for(key, ttl, None, now)?,
                });
            }
        }

        self.record_write(now);
        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {} (KEEPTTL)", key);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.ensure_open()?;
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let now = Instant::now();
        let present = self
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now));
        if !present {
            self.store.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Ok(present)
    }

    async fn increase(&self, key: &str) -> Result<i64> {
        self.apply_delta(key, 1)
    }

    async fn increase_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.apply_delta(key, delta)
    }

    async fn decrease(&self, key: &str) -> Result<i64> {
        self.apply_delta(key, -1)
    }

    async fn decrease_and_delete(&self, key: &str) -> Result<i64> {
        self.ensure_open()?;
        let now = Instant::now();

        let value = match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = if occupied.get().is_expired(now) {
                    0
                } else {
                    parse_counter(key, &occupied.get().value)?
                };
                let next = current.checked_sub(1).ok_or_else(|| overflow(key))?;
                if next <= 0 {
                    occupied.remove();
                } else {
                    occupied.get_mut().value = next.to_string();
                }
                next
            }
            Entry::Vacant(_) => -1,
        };

        self.record_write(now);
        debug!("✓ InMemory DECR-AND-DELETE {} -> {}", key, value);
        Ok(value)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.closed.load(Ordering::Acquire))
    }
}
