// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed store for memoized functions.
//!
//! This crate provides [`RedisStore`], an implementation of
//! [`RemoteStore`](memento_store::RemoteStore) and
//! [`ConnectStore`](memento_store::ConnectStore) on top of the `redis` crate's
//! auto-reconnecting connection manager.
//!
//! # Quick Start
//!
//! ```no_run
//! use memento_redis::RedisStore;
//! use memento_store::RemoteStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), memento_store::Error> {
//! let store = RedisStore::connect("redis://localhost:6379").await?;
//! store.set("greeting", "\"hello\"".to_string(), Some(Duration::from_secs(60))).await?;
//! let value = store.get("greeting").await?;
//! # Ok(())
//! # }
//! ```
//!
//! A `RedisStore` is cheap to clone; clones share one multiplexed connection.

mod store;

#[doc(inline)]
pub use store::RedisStore;
