// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Custom key functions, named arguments, and fail-open behavior.

use memento::{ConfigError, FunctionId, Memoized, function_id, testing::{MockStore, StoreOp}};
use serde::{Deserialize, Serialize};
use tick::Clock;

#[derive(Debug, Serialize)]
struct ProfileQuery {
    user_id: u64,
    include_tags: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    name: String,
    tags: Vec<String>,
}

async fn load_profile(query: ProfileQuery) -> Result<Profile, ConfigError> {
    let tags = if query.include_tags { vec!["admin".to_string()] } else { Vec::new() };
    Ok(Profile {
        name: format!("user-{}", query.user_id),
        tags,
    })
}

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    let store = MockStore::new();

    // Keys derived from a readable template instead of an argument hash
    let profiles = Memoized::builder::<ProfileQuery, Profile>(Clock::new_frozen())
        .store(store.clone())
        .key_prefix("profiles")
        .key_fn(|_: &FunctionId, query: &ProfileQuery| format!("user:{}:{}", query.user_id, query.include_tags))
        .function_id(function_id!(load_profile))
        .build(load_profile);

    let query = ProfileQuery {
        user_id: 123,
        include_tags: true,
    };
    println!("key: {}", profiles.key_for(&query).unwrap_or_default());
    println!("profile: {:?}", profiles.call(query).await?);

    // A store outage degrades to recomputation instead of failing the call
    store.fail_when(|op| matches!(op, StoreOp::Get(_)));
    let profile = profiles
        .call(ProfileQuery {
            user_id: 123,
            include_tags: true,
        })
        .await?;
    println!("during outage: {profile:?}");
    println!("statistics: {}", profiles.statistics());
    Ok(())
}
