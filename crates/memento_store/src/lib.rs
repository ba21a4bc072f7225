// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The remote key-value store contract used by memoized functions.
//!
//! This crate defines the [`RemoteStore`] trait that every backing store must satisfy,
//! the [`ConnectStore`] trait for stores that can be built lazily from a connection
//! descriptor, and the [`Error`] type returned by fallible store operations.
//!
//! # Overview
//!
//! A memoized function only needs three things from its store: read a string by key,
//! write a string with an optional expiry, and delete a batch of keys. Eviction is the
//! store's own business, so the contract says nothing about it.
//!
//! # Implementing a Store
//!
//! ```
//! use memento_store::{Error, RemoteStore};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! struct SimpleStore(RwLock<HashMap<String, String>>);
//!
//! impl RemoteStore for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<Option<String>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: String, _ttl: Option<Duration>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_string(), value);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, keys: &[String]) -> Result<u64, Error> {
//!         let mut map = self.0.write().unwrap();
//!         Ok(keys.iter().filter(|key| map.remove(key.as_str()).is_some()).count() as u64)
//!     }
//! }
//! ```
//!
//! # Error Classification
//!
//! Every [`Error`] carries a [`recoverable::RecoveryInfo`]. Callers use it to tell a
//! store that is briefly unreachable apart from one that was configured wrongly.

pub mod error;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::{ConnectStore, RemoteStore};
