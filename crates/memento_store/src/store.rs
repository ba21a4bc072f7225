// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core traits for remote store clients.
//!
//! [`RemoteStore`] is the minimal surface a memoized function needs from its backing
//! store. [`ConnectStore`] adds construction from a connection descriptor so a client
//! can be created on first use instead of up front.

use std::{sync::Arc, time::Duration};

use crate::Error;

/// Trait for remote key-value store clients.
///
/// All operations are asynchronous and may be called concurrently from many tasks,
/// so implementations must be safe to share.
///
/// Values are opaque strings. Expiry is delegated entirely to the store: `set` with
/// `ttl = None` writes an entry that never expires.
pub trait RemoteStore: Send + Sync {
    /// Reads the value stored under `key`, returning `None` if it is absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    /// Writes `value` under `key`, expiring it after `ttl` if one is given.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes every key in `keys` in a single round trip.
    ///
    /// Returns the number of keys that existed and were removed.
    fn delete(&self, keys: &[String]) -> impl Future<Output = Result<u64, Error>> + Send;
}

/// Trait for store clients that can be built from a connection descriptor.
///
/// The descriptor is store-specific, typically a URL such as `redis://localhost:6379`.
/// A descriptor that can never work should be reported with [`Error::permanent`];
/// a store that is merely unreachable right now with [`Error::transient`].
pub trait ConnectStore: RemoteStore + Sized {
    /// Builds a client from `address`.
    fn connect(address: &str) -> impl Future<Output = Result<Self, Error>> + Send;
}

impl<S: RemoteStore> RemoteStore for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, keys: &[String]) -> impl Future<Output = Result<u64, Error>> + Send {
        (**self).delete(keys)
    }
}
