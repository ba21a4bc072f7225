// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    collections::HashSet,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

/// A point-in-time snapshot of a memoized function's bookkeeping.
///
/// `hits + misses` is the number of calls made since creation or the last
/// invalidation. `currsize` counts the distinct keys this instance has written and
/// not yet invalidated; entries written by other processes are not included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CacheStatistics {
    /// Calls answered from the store without invoking the function.
    pub hits: u64,
    /// Calls that invoked the function, either because the key was absent or the
    /// store could not be read.
    pub misses: u64,
    /// Distinct keys written by this instance.
    pub currsize: u64,
}

impl fmt::Display for CacheStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits={}, misses={}, currsize={}", self.hits, self.misses, self.currsize)
    }
}

/// Counters and the tracked key set shared by all callers of one memoized function.
#[derive(Debug, Default)]
pub(crate) struct Statistics {
    hits: AtomicU64,
    misses: AtomicU64,
    keys: Mutex<HashSet<String>>,
}

impl Statistics {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Tracks a written key and returns the new number of tracked keys.
    pub(crate) fn track(&self, key: String) -> u64 {
        let mut keys = self.keys.lock();
        keys.insert(key);
        keys.len() as u64
    }

    /// Removes and returns every tracked key.
    pub(crate) fn take_keys(&self) -> Vec<String> {
        std::mem::take(&mut *self.keys.lock()).into_iter().collect()
    }

    pub(crate) fn reset_counters(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub(crate) fn tracked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.lock().iter().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub(crate) fn snapshot(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            currsize: self.keys.lock().len() as u64,
        }
    }
}
