// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records all
//! operations and supports failure injection for testing fail-open paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{ConnectStore, Error, RemoteStore};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The encoded value that was written.
        value: String,
        /// The expiry the write was issued with.
        ttl: Option<Duration>,
    },
    /// A bulk delete was performed with the given keys.
    Delete(Vec<String>),
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Values live in memory and expiries are recorded but never enforced. Every
/// operation is recorded for later verification, and operations can be made to
/// fail on demand. Clones share the same data, so a test can keep a handle while
/// a memoized function owns another.
///
/// # Examples
///
/// ```no_run
/// use memento_store::{testing::{MockStore, StoreOp}, RemoteStore};
///
/// # async fn example() {
/// let store = MockStore::new();
///
/// store.set("key", "42".to_string(), None).await.unwrap();
/// assert_eq!(store.get("key").await.unwrap(), Some("42".to_string()));
///
/// assert_eq!(store.operations(), vec![
///     StoreOp::Set { key: "key".to_string(), value: "42".to_string(), ttl: None },
///     StoreOp::Get("key".to_string()),
/// ]);
/// # }
/// ```
///
/// # Failure Injection
///
/// ```no_run
/// use memento_store::{testing::{MockStore, StoreOp}, RemoteStore};
///
/// # async fn example() {
/// let store = MockStore::new();
///
/// // Fail all reads
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("key").await.is_err());
///
/// // Fail only writes to a specific key
/// store.fail_when(|op| matches!(op, StoreOp::Set { key, .. } if key == "forbidden"));
/// assert!(store.set("forbidden", "1".to_string(), None).await.is_err());
/// assert!(store.set("allowed", "1".to_string(), None).await.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
    address: Option<String>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("address", &self.address)
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock store with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<String, String>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            address: None,
        }
    }

    /// Returns the address this store was connected with, if it was built through
    /// [`ConnectStore::connect`].
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Returns the number of entries in the store.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    /// Writes a raw value directly, bypassing operation recording.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.lock().insert(key.into(), value.into());
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should fail.
    /// Failed operations are still recorded but leave the data untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use memento_store::testing::{MockStore, StoreOp};
    ///
    /// let store = MockStore::new();
    ///
    /// // Fail everything
    /// store.fail_when(|_| true);
    ///
    /// // Fail only deletes
    /// store.fail_when(|op| matches!(op, StoreOp::Delete(_)));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp) -> Result<(), Error> {
        let failed = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        let message = match &op {
            StoreOp::Get(_) => "mock: get failed",
            StoreOp::Set { .. } => "mock: set failed",
            StoreOp::Delete(_) => "mock: delete failed",
        };
        self.operations.lock().push(op);
        if failed { Err(Error::transient(message)) } else { Ok(()) }
    }
}

impl RemoteStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.record(StoreOp::Get(key.to_string()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), Error> {
        self.record(StoreOp::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        })?;
        self.data.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, Error> {
        self.record(StoreOp::Delete(keys.to_vec()))?;
        let mut data = self.data.lock();
        Ok(keys.iter().filter(|key| data.remove(key.as_str()).is_some()).count() as u64)
    }
}

impl ConnectStore for MockStore {
    async fn connect(address: &str) -> Result<Self, Error> {
        if address.is_empty() {
            return Err(Error::permanent("mock: empty address"));
        }
        Ok(Self {
            address: Some(address.to_string()),
            ..Self::new()
        })
    }
}
