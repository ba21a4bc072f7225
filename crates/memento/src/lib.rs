// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Read-through memoization of async functions over a remote key-value store.
//!
//! A [`Memoized`] function derives a key from its identity and arguments, answers
//! from the store when it can, and otherwise computes the result and writes it back
//! with an expiry. It provides:
//! - Deterministic keys that are stable across restarts and processes
//! - Lazy connection to the store on first use, or reuse of an existing client
//! - Fail-open behavior: store outages degrade to recomputation, never to errors
//! - Per-function hit, miss and size statistics with bulk invalidation
//! - Structured logging through `tracing` and optional OpenTelemetry metrics
//!
//! # Examples
//!
//! ## Memoizing a Function
//!
//! ```
//! use std::time::Duration;
//!
//! use memento::{ConfigError, Memoized};
//! use memento_store::testing::MockStore;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! async fn compute(x: i32) -> Result<i32, ConfigError> {
//!     Ok(x * 2)
//! }
//!
//! let compute = Memoized::builder::<i32, i32>(Clock::new_frozen())
//!     .store(MockStore::new())
//!     .ttl(Duration::from_secs(3600))
//!     .build(compute);
//!
//! assert_eq!(compute.call(5).await?, 10);
//! assert_eq!(compute.call(5).await?, 10);
//!
//! let stats = compute.statistics();
//! assert_eq!((stats.hits, stats.misses, stats.currsize), (1, 1, 1));
//!
//! compute.invalidate().await;
//! assert_eq!(compute.statistics().currsize, 0);
//! # Ok::<(), ConfigError>(())
//! # }).unwrap();
//! ```
//!
//! ## Named Arguments
//!
//! Arguments are any [`serde::Serialize`] value. Several positional arguments are
//! passed as a tuple; named arguments as a struct. Field order never affects the key.
//!
//! ```
//! use memento::{ConfigError, FunctionId, Memoized};
//! use memento_store::testing::MockStore;
//! use serde::Serialize;
//! use tick::Clock;
//!
//! #[derive(Serialize)]
//! struct Query {
//!     table: String,
//!     limit: u32,
//! }
//!
//! let search = Memoized::builder::<Query, Vec<String>>(Clock::new_frozen())
//!     .store(MockStore::new())
//!     .key_prefix("search")
//!     .function_id(FunctionId::new("app::db", "search"))
//!     .build(|query: Query| async move { Ok::<_, ConfigError>(vec![query.table; query.limit as usize]) });
//!
//! let key = search.key_for(&Query { table: "users".into(), limit: 2 })?;
//! assert!(key.starts_with("search:app::db:search:"));
//! # Ok::<(), memento::KeyError>(())
//! ```

mod binding;
pub mod builder;
pub mod codec;
mod error;
pub mod key;
mod memo;
mod stats;
mod telemetry;

#[doc(inline)]
pub use builder::MemoBuilder;
#[doc(inline)]
pub use error::{CodecError, ConfigError, KeyError};
#[doc(inline)]
pub use key::{FunctionId, KeyFn};
#[doc(inline)]
pub use memo::Memoized;
#[doc(inline)]
pub use stats::CacheStatistics;
#[doc(inline)]
pub use telemetry::MemoTelemetry;

/// Test doubles for memoized functions.
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing {
    #[doc(inline)]
    pub use memento_store::testing::{MockStore, StoreOp};
}
