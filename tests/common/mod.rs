//! Behavior every `CacheBackend` must share, written once and run against each backend.
//!
//! Each scenario takes a key prefix so that runs against a shared Redis
//! server do not collide.

#![allow(dead_code)]

use counter_cache::{CacheBackend, Error};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn key(prefix: &str, name: &str) -> String {
    format!("{}:{}", prefix, name)
}

pub async fn absent_key_reads_as_empty<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "absent");
    cache.delete(&k).await.expect("delete failed");

    assert_eq!(cache.get(&k).await.expect("get failed"), "");
    assert_eq!(cache.lookup(&k).await.expect("lookup failed"), None);
    assert!(!cache.exists(&k).await.expect("exists failed"));
}

pub async fn set_then_get_round_trips<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "greeting");

    cache.set(&k, "hello", None).await.expect("set failed");
    assert_eq!(cache.get(&k).await.expect("get failed"), "hello");
    assert!(cache.exists(&k).await.expect("exists failed"));

    cache.set(&k, "bonjour", None).await.expect("set failed");
    assert_eq!(cache.get(&k).await.expect("get failed"), "bonjour");

    cache.delete(&k).await.expect("delete failed");
}

pub async fn set_if_not_exists_keeps_first_value<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "lock");
    cache.delete(&k).await.expect("delete failed");

    let first = cache
        .set_if_not_exists(&k, "owner-1", None)
        .await
        .expect("set_if_not_exists failed");
    let second = cache
        .set_if_not_exists(&k, "owner-2", None)
        .await
        .expect("set_if_not_exists failed");

    assert!(first);
    assert!(!second);
    assert_eq!(cache.get(&k).await.expect("get failed"), "owner-1");

    cache.delete(&k).await.expect("delete failed");
}

pub async fn delete_is_idempotent<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "gone");

    cache.set(&k, "x", None).await.expect("set failed");
    cache.delete(&k).await.expect("first delete failed");
    cache.delete(&k).await.expect("second delete failed");

    assert!(!cache.exists(&k).await.expect("exists failed"));
}

pub async fn counters_start_from_zero<B: CacheBackend>(cache: &B, prefix: &str) {
    let up = key(prefix, "up");
    let down = key(prefix, "down");
    cache.delete(&up).await.expect("delete failed");
    cache.delete(&down).await.expect("delete failed");

    assert_eq!(cache.increase(&up).await.expect("increase failed"), 1);
    assert_eq!(cache.increase(&up).await.expect("increase failed"), 2);
    assert_eq!(cache.decrease(&down).await.expect("decrease failed"), -1);
    assert_eq!(cache.get(&up).await.expect("get failed"), "2");

    cache.delete(&up).await.expect("delete failed");
    cache.delete(&down).await.expect("delete failed");
}

pub async fn increase_by_is_reversible<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "balance");
    cache.set(&k, "40", None).await.expect("set failed");

    assert_eq!(cache.increase_by(&k, 17).await.expect("increase_by failed"), 57);
    assert_eq!(cache.increase_by(&k, -17).await.expect("increase_by failed"), 40);
    assert_eq!(cache.increase_by(&k, -50).await.expect("increase_by failed"), -10);

    cache.delete(&k).await.expect("delete failed");
}

pub async fn non_numeric_counter_is_invalid_value<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "name");

    // Redis only accepts canonical integers: no `+`, no leading zeros, no `-0`
    for stored in ["alice", "", "+5", "007", "-0", " 5", "1.5", "9223372036854775808"] {
        cache.set(&k, stored, None).await.expect("set failed");

        for result in [
            cache.increase(&k).await,
            cache.increase_by(&k, 3).await,
            cache.decrease(&k).await,
            cache.decrease_and_delete(&k).await,
        ] {
            match result {
                Err(Error::InvalidValue(_)) => {}
                other => panic!("expected InvalidValue for {:?}, got {:?}", stored, other),
            }
        }
        assert_eq!(cache.get(&k).await.expect("get failed"), stored);
    }

    cache.delete(&k).await.expect("delete failed");
}

pub async fn decrease_and_delete_removes_at_zero<B: CacheBackend>(cache: &B, prefix: &str) {
    let last = key(prefix, "last");
    cache.set(&last, "1", None).await.expect("set failed");
    assert_eq!(
        cache.decrease_and_delete(&last).await.expect("decrease_and_delete failed"),
        0
    );
    assert!(!cache.exists(&last).await.expect("exists failed"));

    let many = key(prefix, "many");
    cache.set(&many, "5", None).await.expect("set failed");
    assert_eq!(
        cache.decrease_and_delete(&many).await.expect("decrease_and_delete failed"),
        4
    );
    assert!(cache.exists(&many).await.expect("exists failed"));
    assert_eq!(cache.get(&many).await.expect("get failed"), "4");

    cache.delete(&many).await.expect("delete failed");
}

pub async fn decrease_and_delete_twice<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "b");
    cache.set(&k, "2", None).await.expect("set failed");

    assert_eq!(
        cache.decrease_and_delete(&k).await.expect("decrease_and_delete failed"),
        1
    );
    assert!(cache.exists(&k).await.expect("exists failed"));

    assert_eq!(
        cache.decrease_and_delete(&k).await.expect("decrease_and_delete failed"),
        0
    );
    assert!(!cache.exists(&k).await.expect("exists failed"));
}

pub async fn decrease_and_delete_on_absent_key<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "never-set");
    cache.delete(&k).await.expect("delete failed");

    assert_eq!(
        cache.decrease_and_delete(&k).await.expect("decrease_and_delete failed"),
        -1
    );
    assert!(!cache.exists(&k).await.expect("exists failed"));
}

/// Must run on a multi-threaded runtime to exercise real contention.
pub async fn concurrent_increases_lose_no_updates<B: CacheBackend>(cache: &B, prefix: &str) {
    const CALLERS: i64 = 64;
    let k = key(prefix, "hits");
    cache.delete(&k).await.expect("delete failed");

    let handles = (0..CALLERS).map(|_| {
        let cache = cache.clone();
        let k = k.clone();
        tokio::spawn(async move { cache.increase(&k).await })
    });

    let mut values: Vec<i64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .expect("task panicked")
                .expect("increase failed")
        })
        .collect();
    values.sort_unstable();

    assert_eq!(values, (1..=CALLERS).collect::<Vec<_>>());
    assert_eq!(cache.get(&k).await.expect("get failed"), CALLERS.to_string());

    cache.delete(&k).await.expect("delete failed");
}

/// Must run on a multi-threaded runtime to exercise real contention.
pub async fn concurrent_releases_delete_exactly_once<B: CacheBackend>(cache: &B, prefix: &str) {
    const HOLDERS: i64 = 32;
    let k = key(prefix, "holders");
    cache
        .set(&k, &HOLDERS.to_string(), None)
        .await
        .expect("set failed");

    let handles = (0..HOLDERS).map(|_| {
        let cache = cache.clone();
        let k = k.clone();
        tokio::spawn(async move { cache.decrease_and_delete(&k).await })
    });

    let mut values: Vec<i64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined
                .expect("task panicked")
                .expect("decrease_and_delete failed")
        })
        .collect();
    values.sort_unstable();

    assert_eq!(values, (0..HOLDERS).collect::<Vec<_>>());
    assert!(!cache.exists(&k).await.expect("exists failed"));
}

/// Uses real time; the expiry window is short but not instant.
pub async fn set_without_ttl_keeps_expiry<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "session");

    cache
        .set(&k, "v1", Some(Duration::from_millis(300)))
        .await
        .expect("set failed");
    cache.set(&k, "v2", None).await.expect("set failed");
    assert_eq!(cache.get(&k).await.expect("get failed"), "v2");

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(!cache.exists(&k).await.expect("exists failed"));
    assert_eq!(cache.get(&k).await.expect("get failed"), "");
}

pub async fn closed_backend_rejects_operations<B: CacheBackend>(cache: &B, prefix: &str) {
    let k = key(prefix, "after-close");
    assert!(cache.health_check().await.expect("health check failed"));

    cache.close().await.expect("close failed");

    assert!(matches!(cache.get(&k).await, Err(Error::Closed)));
    assert!(matches!(cache.increase(&k).await, Err(Error::Closed)));
    assert!(matches!(cache.close().await, Err(Error::Closed)));
    assert!(!cache.health_check().await.expect("health check failed"));
}
