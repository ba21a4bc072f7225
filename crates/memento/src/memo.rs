// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt, marker::PhantomData, time::Duration};

use memento_store::RemoteStore;
use serde::{Serialize, de::DeserializeOwned};
use tick::Clock;

use crate::{
    ConfigError, KeyError,
    binding::StoreBinding,
    builder::MemoBuilder,
    codec,
    key::{FunctionId, KeyDeriver},
    stats::{CacheStatistics, Statistics},
    telemetry::{MemoActivity, MemoOperation, MemoTelemetry, ext::ClockExt},
};

/// An async function whose results are cached in a remote store.
///
/// Each call derives a key from the function's identity and its arguments, answers
/// from the store when the key is present, and otherwise invokes the function and
/// writes its result back. Store faults never fail a call: an unreadable store or an
/// undecodable entry counts as a miss, and a failed write is logged and ignored. The
/// function's own errors are returned unchanged and never cached.
///
/// Concurrent calls with equal arguments that both miss will both invoke the function.
///
/// # Examples
///
/// ```
/// use memento::{ConfigError, Memoized};
/// use memento_store::testing::MockStore;
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let compute = Memoized::builder::<i32, i32>(Clock::new_frozen())
///     .store(MockStore::new())
///     .build(|x: i32| async move { Ok::<_, ConfigError>(x * 2) });
///
/// assert_eq!(compute.call(5).await?, 10);
/// assert_eq!(compute.statistics().misses, 1);
///
/// assert_eq!(compute.call(5).await?, 10);
/// assert_eq!(compute.statistics().hits, 1);
/// assert_eq!(compute.statistics().misses, 1);
/// # Ok::<(), ConfigError>(())
/// # }).unwrap();
/// ```
pub struct Memoized<A, T, F, S> {
    id: FunctionId,
    label: String,
    function: F,
    binding: StoreBinding<S>,
    keys: KeyDeriver<A>,
    ttl: Option<Duration>,
    stats: Statistics,
    telemetry: MemoTelemetry,
    clock: Clock,
    _types: PhantomData<fn(A) -> T>,
}

impl Memoized<(), (), (), ()> {
    /// Starts building a memoized function taking `A` and producing `T`.
    ///
    /// The clock times store operations for telemetry.
    #[must_use]
    pub fn builder<A, T>(clock: Clock) -> MemoBuilder<A, T> {
        MemoBuilder::new(clock)
    }
}

impl<A, T, F, S> Memoized<A, T, F, S> {
    pub(crate) fn new(
        id: FunctionId,
        function: F,
        binding: StoreBinding<S>,
        keys: KeyDeriver<A>,
        ttl: Option<Duration>,
        telemetry: MemoTelemetry,
        clock: Clock,
    ) -> Self {
        Self {
            label: id.to_string(),
            id,
            function,
            binding,
            keys,
            ttl,
            stats: Statistics::default(),
            telemetry,
            clock,
            _types: PhantomData,
        }
    }

    /// Returns the identity used in default keys.
    #[must_use]
    pub fn function_id(&self) -> &FunctionId {
        &self.id
    }

    /// Returns the expiry applied to written entries.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the wrapped function.
    #[must_use]
    pub fn inner(&self) -> &F {
        &self.function
    }

    /// Returns the store client, if one was supplied or has been connected.
    #[must_use]
    pub fn store(&self) -> Option<&S> {
        self.binding.get()
    }

    /// Returns a snapshot of the hit, miss and size counters.
    #[must_use]
    pub fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot()
    }

    /// Returns the keys written by this instance and not yet invalidated, sorted.
    #[must_use]
    pub fn tracked_keys(&self) -> Vec<String> {
        self.stats.tracked_keys()
    }
}

impl<A, T, F, S> Memoized<A, T, F, S>
where
    A: Serialize,
{
    /// Returns the key a call with `args` reads and writes.
    ///
    /// # Errors
    ///
    /// Returns an error if no custom key function is configured and `args` has no
    /// JSON representation.
    pub fn key_for(&self, args: &A) -> Result<String, KeyError> {
        self.keys.derive(&self.id, args)
    }
}

impl<A, T, F, S> Memoized<A, T, F, S>
where
    A: Serialize,
    T: Serialize + DeserializeOwned,
    S: RemoteStore,
{
    /// Calls the function, answering from the store when possible.
    ///
    /// # Errors
    ///
    /// Returns the function's own error unchanged, or a [`ConfigError`] converted into
    /// `E` when the function is not wired to a usable store.
    pub async fn call<Fut, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ConfigError>,
    {
        let store = self.resolve_store().await?;

        let key = match self.keys.derive(&self.id, &args) {
            Ok(key) => Some(key),
            Err(e) => {
                self.telemetry.record_fault(&self.label, MemoOperation::Get, None, &e, None);
                None
            }
        };

        if let (Some(store), Some(key)) = (store, key.as_deref())
            && let Some(value) = self.lookup(store, key).await
        {
            self.stats.hit();
            return Ok(value);
        }

        self.stats.miss();
        let value = (self.function)(args).await?;

        if let (Some(store), Some(key)) = (store, key) {
            self.write(store, key, &value).await;
        }
        Ok(value)
    }

    async fn lookup(&self, store: &S, key: &str) -> Option<T> {
        let timed = self.clock.timed_async(store.get(key)).await;
        let duration = Some(timed.duration);

        match timed.result {
            Ok(Some(encoded)) => match codec::decode(&encoded) {
                Ok(value) => {
                    self.telemetry.record(&self.label, MemoOperation::Get, MemoActivity::Hit, duration);
                    Some(value)
                }
                Err(e) => {
                    self.telemetry.record_fault(&self.label, MemoOperation::Get, Some(key), &e, duration);
                    None
                }
            },
            Ok(None) => {
                self.telemetry.record(&self.label, MemoOperation::Get, MemoActivity::Miss, duration);
                None
            }
            Err(e) => {
                self.telemetry.record_fault(&self.label, MemoOperation::Get, Some(key), &e, duration);
                None
            }
        }
    }

    async fn write(&self, store: &S, key: String, value: &T) {
        let encoded = match codec::encode(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.telemetry.record_fault(&self.label, MemoOperation::Set, Some(&key), &e, None);
                return;
            }
        };

        let timed = self.clock.timed_async(store.set(&key, encoded, self.ttl)).await;
        match timed.result {
            Ok(()) => {
                self.telemetry
                    .record(&self.label, MemoOperation::Set, MemoActivity::Stored, Some(timed.duration));
                let tracked = self.stats.track(key);
                self.telemetry.record_tracked(&self.label, tracked);
            }
            Err(e) => {
                self.telemetry
                    .record_fault(&self.label, MemoOperation::Set, Some(&key), &e, Some(timed.duration));
            }
        }
    }
}

impl<A, T, F, S> Memoized<A, T, F, S>
where
    S: RemoteStore,
{
    /// Deletes every tracked key from the store and resets the counters.
    ///
    /// A failed delete is logged and otherwise ignored; the local bookkeeping is reset
    /// either way. Keys written by other processes are not affected.
    pub async fn invalidate(&self) {
        let keys = self.stats.take_keys();

        if !keys.is_empty()
            && let Some(store) = self.binding.get()
        {
            let timed = self.clock.timed_async(store.delete(&keys)).await;
            match timed.result {
                Ok(_) => self
                    .telemetry
                    .record(&self.label, MemoOperation::Delete, MemoActivity::Invalidated, Some(timed.duration)),
                Err(e) => self
                    .telemetry
                    .record_fault(&self.label, MemoOperation::Delete, None, &e, Some(timed.duration)),
            }
        }

        self.stats.reset_counters();
        self.telemetry.record_tracked(&self.label, self.stats.snapshot().currsize);
    }

    /// Returns the store to use for this call.
    ///
    /// `Ok(None)` means the store is temporarily unreachable and the call proceeds
    /// without caching.
    async fn resolve_store(&self) -> Result<Option<&S>, ConfigError> {
        if let Some(store) = self.binding.get() {
            return Ok(Some(store));
        }
        let Some(address) = self.binding.address() else {
            return Err(ConfigError::new(self.label.clone()));
        };

        let timed = self.clock.timed_async(self.binding.connect()).await;
        match timed.result {
            Ok(store) => {
                self.telemetry
                    .record(&self.label, MemoOperation::Connect, MemoActivity::Connected, Some(timed.duration));
                Ok(Some(store))
            }
            Err(e) => {
                self.telemetry
                    .record_fault(&self.label, MemoOperation::Connect, Some(address), &e, Some(timed.duration));
                if e.is_permanent() {
                    Err(ConfigError::caused_by(self.label.clone(), e))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

impl<A, T, F, S> fmt::Debug for Memoized<A, T, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("id", &self.id)
            .field("binding", &self.binding)
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
