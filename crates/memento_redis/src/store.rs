// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use memento_store::{ConnectStore, Error, RemoteStore};
use redis::{AsyncCommands, ErrorKind, RedisError, aio::ConnectionManager};

/// A [`RemoteStore`] backed by Redis.
///
/// Reads map to `GET`, writes to `SET` with `EX` or `PX` expiry, and bulk deletes to
/// a single `DEL`. The underlying [`ConnectionManager`] reconnects on its own after
/// the server goes away, so a store outage only fails the operations issued while it
/// lasts.
///
/// # Examples
///
/// Reusing a connection the application already holds:
///
/// ```no_run
/// use memento_redis::RedisStore;
///
/// # async fn example() -> Result<(), redis::RedisError> {
/// let client = redis::Client::open("redis://localhost:6379")?;
/// let manager = client.get_connection_manager().await?;
/// let store = RedisStore::from_manager(manager);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
    address: Option<String>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("address", &self.address).finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns a permanent error if `url` is not a valid Redis connection URL, and a
    /// transient error if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(Error::permanent)?;
        let manager = client.get_connection_manager().await.map_err(classify)?;
        tracing::debug!(redis.address = url, "connected to redis");
        Ok(Self {
            manager,
            address: Some(url.to_string()),
        })
    }

    /// Wraps a connection manager created elsewhere.
    #[must_use]
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager, address: None }
    }

    /// Returns the URL this store connected to, if it was created with [`connect`](Self::connect).
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Returns a handle to the underlying connection manager.
    #[must_use]
    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(classify)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        match ttl.map(Expiry::from) {
            None => conn.set::<_, _, ()>(key, value).await,
            Some(Expiry::Seconds(seconds)) => conn.set_ex::<_, _, ()>(key, value, seconds).await,
            Some(Expiry::Millis(millis)) => conn.pset_ex::<_, _, ()>(key, value, millis).await,
        }
        .map_err(classify)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.manager.clone();
        conn.del(keys).await.map_err(classify)
    }
}

impl ConnectStore for RedisStore {
    async fn connect(address: &str) -> Result<Self, Error> {
        Self::connect(address).await
    }
}

/// Expiry in the coarsest unit that represents the duration exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Seconds(u64),
    Millis(u64),
}

impl From<Duration> for Expiry {
    fn from(ttl: Duration) -> Self {
        if ttl.subsec_nanos() == 0 && ttl.as_secs() > 0 {
            Self::Seconds(ttl.as_secs())
        } else {
            // Redis rejects a zero expiry and has millisecond resolution; round up to at least 1ms.
            let millis = ttl.as_nanos().div_ceil(1_000_000).max(1);
            Self::Millis(u64::try_from(millis).unwrap_or(u64::MAX))
        }
    }
}

fn classify(error: RedisError) -> Error {
    if error.kind() == ErrorKind::InvalidClientConfig {
        Error::permanent(error)
    } else {
        Error::transient(error)
    }
}
