//! Cache backends and the capability trait they implement.
//!
//! Application code is written against [`CacheBackend`] and receives a
//! concrete backend by injection:
//!
//! - [`InMemoryBackend`] (feature `inmemory`, default): process-local store
//! - [`RedisBackend`] (feature `redis`): remote Redis store

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::{RedisBackend, RedisConfig};

/// Operations every cache backend must support.
///
/// All values are strings; counters are decimal `i64` values stored in the
/// same field. A `ttl` of `None` on a write leaves any existing expiry on
/// the key untouched, `Some(Duration::ZERO)` stores the value without an
/// expiry, and any other duration replaces the expiry.
///
/// Counter operations are atomic per key against concurrent callers. Dropping
/// a returned future cancels the operation.
///
/// # Example
///
/// ```
/// # use counter_cache::backend::{CacheBackend, InMemoryBackend};
/// # use counter_cache::error::Result;
/// async fn acquire_slot<B: CacheBackend>(cache: &B, key: &str) -> Result<i64> {
///     cache.increase(key).await
/// }
///
/// async fn release_slot<B: CacheBackend>(cache: &B, key: &str) -> Result<i64> {
///     // removes the key once the last holder leaves
///     cache.decrease_and_delete(key).await
/// }
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let cache = InMemoryBackend::new();
/// assert_eq!(acquire_slot(&cache, "slots").await?, 1);
/// assert_eq!(release_slot(&cache, "slots").await?, 0);
/// assert!(!cache.exists("slots").await?);
/// # Ok(())
/// # }
/// ```
pub trait CacheBackend: Clone + Send + Sync + 'static {
    /// Release backend resources.
    ///
    /// Call once, after in-flight operations have finished. Operations issued
    /// afterwards fail with [`Error::Closed`](crate::error::Error::Closed).
    fn close(&self) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a value, distinguishing a missing key (`None`) from an empty
    /// value (`Some("")`).
    fn lookup(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Fetch a value, returning an empty string when the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<String>> + Send {
        async move { Ok(self.lookup(key).await?.unwrap_or_default()) }
    }

    /// Store `value` only if `key` does not exist yet.
    ///
    /// Returns `true` when the value was written, `false` when the key was
    /// already present (its value is left unchanged).
    fn set_if_not_exists(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Store `value` unconditionally.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether `key` is currently present and not expired.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Add one to the counter at `key`, starting from 0 if absent.
    fn increase(&self, key: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Add `delta` (which may be negative) to the counter at `key`.
    fn increase_by(&self, key: &str, delta: i64) -> impl Future<Output = Result<i64>> + Send;

    /// Subtract one from the counter at `key`, starting from 0 if absent.
    fn decrease(&self, key: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Subtract one from the counter at `key` and delete the key if the
    /// result is zero or negative, as a single atomic step.
    ///
    /// Returns the decremented value whichever branch was taken. An absent
    /// key counts as 0, so the result is -1 and nothing is left behind.
    fn decrease_and_delete(&self, key: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Check that the backend is reachable.
    ///
    /// Reports `Ok(false)` rather than an error when the store is down.
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send;
}
