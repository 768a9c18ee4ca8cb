//! # counter-cache
//!
//! A small, backend-agnostic key-value cache interface with atomic counters.
//!
//! ## Features
//!
//! - **Backend Agnostic:** Application code depends on [`CacheBackend`], not on a cache client
//! - **Atomic Counters:** `increase`, `decrease` and `increase_by` are atomic per key
//! - **Decrement-and-Delete:** A counter is decremented and removed at zero in one server-side step
//! - **TTL Aware:** Writes without a TTL keep the key's existing expiry
//! - **Backends:** Redis (feature `redis`) and in-memory (feature `inmemory`, default)
//!
//! ## Quick Start
//!
//! ```
//! use counter_cache::{backend::InMemoryBackend, CacheBackend, Result};
//! use std::time::Duration;
//!
//! async fn remember_visit<B: CacheBackend>(cache: &B, page: &str) -> Result<i64> {
//!     let key = format!("visits:{}", page);
//!     let count = cache.increase(&key).await?;
//!     if count == 1 {
//!         // first visit opens a one-hour window
//!         cache.set(&key, "1", Some(Duration::from_secs(3600))).await?;
//!     }
//!     Ok(count)
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let cache = InMemoryBackend::new();
//! assert_eq!(remember_visit(&cache, "home").await?, 1);
//! assert_eq!(remember_visit(&cache, "home").await?, 2);
//! # Ok(())
//! # }
//! ```
//!
//! With the `redis` feature, swap the backend without touching callers:
//!
//! ```ignore
//! let cache = RedisBackend::new(RedisConfig::from_env()).await?;
//! remember_visit(&cache, "home").await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod error;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
