//! Basic usage of the cache interface: a rate counter and a shared lease.
//!
//! Runs against memory by default. With `--features redis` and `REDIS_URL`
//! set, the same code runs against Redis.

use counter_cache::{error::Result, CacheBackend};
use std::time::Duration;

/// Count requests per client inside a fixed window.
async fn allow_request<B: CacheBackend>(cache: &B, client: &str, limit: i64) -> Result<bool> {
    let key = format!("rate:{}", client);
    // start the window only once; later writes keep its expiry
    cache
        .set_if_not_exists(&key, "0", Some(Duration::from_secs(60)))
        .await?;
    let used = cache.increase(&key).await?;
    Ok(used <= limit)
}

/// Reference-counted lease: the key disappears when the last holder releases it.
async fn lease_demo<B: CacheBackend>(cache: &B) -> Result<()> {
    for holder in 1..=3 {
        let holders = cache.increase("lease:report").await?;
        println!("  holder {} acquired lease (holders: {})", holder, holders);
    }

    for holder in 1..=3 {
        let remaining = cache.decrease_and_delete("lease:report").await?;
        println!(
            "  holder {} released lease (remaining: {}, key present: {})",
            holder,
            remaining,
            cache.exists("lease:report").await?
        );
    }
    Ok(())
}

async fn run<B: CacheBackend>(cache: B) -> Result<()> {
    println!("1. Rate limiting (limit: 3 per minute)");
    for attempt in 1..=5 {
        let allowed = allow_request(&cache, "client-42", 3).await?;
        println!("  request {} -> {}", attempt, if allowed { "allowed" } else { "rejected" });
    }

    println!("\n2. Shared lease");
    lease_demo(&cache).await?;

    println!("\n3. Absent keys are not errors");
    println!("  get(\"nothing\") = {:?}", cache.get("nothing").await?);
    println!("  lookup(\"nothing\") = {:?}", cache.lookup("nothing").await?);

    cache.delete("rate:client-42").await?;
    cache.close().await
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== counter-cache - Basic Example ===\n");

    #[cfg(feature = "redis")]
    if std::env::var("REDIS_URL").is_ok() {
        let config = counter_cache::backend::RedisConfig::from_env();
        println!("Using Redis at {}\n", config.redacted_url());
        let cache = counter_cache::backend::RedisBackend::new(config).await?;
        return run(cache).await;
    }

    println!("Using in-memory backend\n");
    run(counter_cache::backend::InMemoryBackend::new()).await
}
