// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memoizing an async function: hits, misses, and invalidation.

use std::time::Duration;

use memento::{ConfigError, Memoized, testing::MockStore};
use tick::Clock;

async fn compute(x: i32) -> Result<i32, ConfigError> {
    // Stand-in for an expensive lookup
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(x * 2)
}

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    let store = MockStore::new();
    let compute = Memoized::builder::<i32, i32>(Clock::new_frozen())
        .store(store.clone())
        .key_prefix("demo")
        .ttl(Duration::from_secs(3600))
        .build(compute);

    // First call computes and writes, second call is answered from the store
    println!("compute(5) = {}", compute.call(5).await?);
    println!("compute(5) = {}", compute.call(5).await?);
    println!("statistics: {}", compute.statistics());

    for key in compute.tracked_keys() {
        println!("stored {key} = {}", store.value(&key).unwrap_or_default());
    }

    compute.invalidate().await;
    println!("after invalidate: {} (store holds {} entries)", compute.statistics(), store.entry_count());
    Ok(())
}
