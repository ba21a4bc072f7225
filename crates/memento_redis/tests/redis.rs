// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `RedisStore`.
//!
//! Tests that need a live server are ignored by default. Run them with
//! `REDIS_URL=redis://127.0.0.1:6379 cargo test -p memento_redis -- --ignored`.

use std::time::Duration;

use memento::{ConfigError, Memoized};
use memento_redis::RedisStore;
use memento_store::{ConnectStore, RemoteStore};
use recoverable::{Recovery, RecoveryKind};
use serde::{Deserialize, Serialize};
use tick::Clock;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("memento-test:{prefix}:{nanos}")
}

#[tokio::test]
async fn connect_rejects_malformed_url_permanently() {
    let error = RedisStore::connect("definitely not a url").await.expect_err("connect should fail");
    assert!(error.is_permanent());
    assert_eq!(error.recovery().kind(), RecoveryKind::Never);
}

#[tokio::test]
async fn connect_through_trait_rejects_unknown_scheme() {
    let error = <RedisStore as ConnectStore>::connect("http://localhost:6379")
        .await
        .expect_err("connect should fail");
    assert!(error.is_permanent());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn set_get_delete_round_trip() {
    let store = RedisStore::connect(&redis_url()).await.expect("connect failed");
    assert_eq!(store.address(), Some(redis_url().as_str()));

    let key = unique("round-trip");
    store.set(&key, "{\"a\":1}".to_string(), None).await.expect("set failed");
    assert_eq!(store.get(&key).await.expect("get failed"), Some("{\"a\":1}".to_string()));

    let removed = store.delete(&[key.clone(), unique("absent")]).await.expect("delete failed");
    assert_eq!(removed, 1);
    assert_eq!(store.get(&key).await.expect("get failed"), None);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn entries_expire_after_ttl() {
    let store = RedisStore::connect(&redis_url()).await.expect("connect failed");
    let key = unique("ttl");

    store
        .set(&key, "1".to_string(), Some(Duration::from_millis(200)))
        .await
        .expect("set failed");
    assert!(store.get(&key).await.expect("get failed").is_some());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(store.get(&key).await.expect("get failed").is_none());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn empty_delete_skips_round_trip() {
    let store = RedisStore::connect(&redis_url()).await.expect("connect failed");
    assert_eq!(store.delete(&[]).await.expect("delete failed"), 0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    tags: Vec<String>,
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn memoized_function_caches_in_redis() {
    let prefix = unique("memo");
    let profile = Memoized::builder::<u32, Profile>(Clock::new_frozen())
        .store_address::<RedisStore>(redis_url())
        .key_prefix(prefix)
        .ttl(Duration::from_secs(30))
        .build(|id: u32| async move {
            Ok::<_, ConfigError>(Profile {
                name: format!("user-{id}"),
                tags: vec!["a".to_string(), "b".to_string()],
            })
        });

    let first = profile.call(7).await.expect("call failed");
    let second = profile.call(7).await.expect("call failed");
    assert_eq!(first, second);

    let stats = profile.statistics();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.currsize, 1);

    let key = profile.key_for(&7).expect("key derivation failed");
    let store = profile.store().expect("store should be bound after a call");
    assert!(store.get(&key).await.expect("get failed").is_some());

    profile.invalidate().await;
    assert_eq!(profile.statistics().currsize, 0);
    assert!(store.get(&key).await.expect("get failed").is_none());
}
