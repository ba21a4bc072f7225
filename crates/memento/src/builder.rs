// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for memoized functions.

use std::{fmt, marker::PhantomData, sync::Arc, time::Duration};

use memento_store::{ConnectStore, RemoteStore};
use tick::Clock;

use crate::{
    Memoized,
    binding::StoreBinding,
    key::{FunctionId, KeyDeriver, KeyFn},
    telemetry::MemoTelemetry,
};

/// Expiry applied to written entries unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Builder for a [`Memoized`] function.
///
/// Created by [`Memoized::builder`]. The first step chooses how the store is reached;
/// the remaining options may be set in any order before [`build`](Self::build).
///
/// | method | effect |
/// |---|---|
/// | [`store`](MemoBuilder::store) | reuse a client the caller already holds |
/// | [`store_address`](MemoBuilder::store_address) | connect lazily on first use |
/// | [`store_type`](MemoBuilder::store_type) | no client yet; first use fails with [`ConfigError`](crate::ConfigError) |
/// | [`key_prefix`](Self::key_prefix) | namespace every key |
/// | [`ttl`](Self::ttl) / [`no_expiration`](Self::no_expiration) | expiry of written entries |
/// | [`key_fn`](Self::key_fn) | replace the default key derivation |
/// | [`function_id`](Self::function_id) | override the identity used in default keys |
/// | [`telemetry`](Self::telemetry) | logging and metrics sink |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use memento::{ConfigError, Memoized};
/// use memento_store::testing::MockStore;
/// use tick::Clock;
///
/// let double = Memoized::builder::<i32, i32>(Clock::new_frozen())
///     .store(MockStore::new())
///     .key_prefix("math")
///     .ttl(Duration::from_secs(3600))
///     .build(|x: i32| async move { Ok::<_, ConfigError>(x * 2) });
///
/// assert_eq!(double.ttl(), Some(Duration::from_secs(3600)));
/// ```
pub struct MemoBuilder<A, T, S = ()> {
    clock: Clock,
    binding: StoreBinding<S>,
    key_prefix: Option<String>,
    ttl: Option<Duration>,
    key_fn: Option<KeyFn<A>>,
    function_id: Option<FunctionId>,
    telemetry: MemoTelemetry,
    _types: PhantomData<fn(A) -> T>,
}

impl<A, T> MemoBuilder<A, T, ()> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            binding: StoreBinding::Unwired,
            key_prefix: None,
            ttl: Some(DEFAULT_TTL),
            key_fn: None,
            function_id: None,
            telemetry: MemoTelemetry::default(),
            _types: PhantomData,
        }
    }

    /// Uses an existing store client.
    ///
    /// The client is never closed by the memoized function. To share one client
    /// between several memoized functions, pass an `Arc` or a cheaply cloneable handle.
    pub fn store<S>(self, store: S) -> MemoBuilder<A, T, S>
    where
        S: RemoteStore,
    {
        self.with_binding(StoreBinding::Ready(store))
    }

    /// Connects to the store at `address` on first use.
    ///
    /// The client is built once and reused for the life of the memoized function. A
    /// transient connection failure makes that call compute without caching; the next
    /// call tries again. An address the store rejects as malformed fails the call with
    /// a [`ConfigError`](crate::ConfigError).
    pub fn store_address<S>(self, address: impl Into<String>) -> MemoBuilder<A, T, S>
    where
        S: ConnectStore + 'static,
    {
        self.with_binding(StoreBinding::lazy(address.into()))
    }

    /// Selects the store type without providing a client or address.
    ///
    /// Every call fails with a [`ConfigError`](crate::ConfigError) unless an address is
    /// supplied later through [`address`](MemoBuilder::address).
    pub fn store_type<S>(self) -> MemoBuilder<A, T, S>
    where
        S: RemoteStore,
    {
        self.with_binding(StoreBinding::Unwired)
    }

    fn with_binding<S>(self, binding: StoreBinding<S>) -> MemoBuilder<A, T, S> {
        MemoBuilder {
            clock: self.clock,
            binding,
            key_prefix: self.key_prefix,
            ttl: self.ttl,
            key_fn: self.key_fn,
            function_id: self.function_id,
            telemetry: self.telemetry,
            _types: PhantomData,
        }
    }
}

impl<A, T, S> MemoBuilder<A, T, S>
where
    S: ConnectStore + 'static,
{
    /// Sets the address to connect to on first use.
    ///
    /// Has no effect when a client was supplied through [`store`](MemoBuilder::store),
    /// which always takes precedence.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        if !matches!(self.binding, StoreBinding::Ready(_)) {
            self.binding = StoreBinding::lazy(address.into());
        }
        self
    }
}

impl<A, T, S> MemoBuilder<A, T, S> {
    /// Prepends `prefix` and a `:` separator to every key.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the expiry of written entries. Defaults to [`DEFAULT_TTL`].
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Writes entries without an expiry.
    #[must_use]
    pub fn no_expiration(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Replaces the default key derivation.
    ///
    /// The function receives the memoized function's identity and the call's
    /// arguments. A configured prefix is still prepended to its result.
    ///
    /// ```
    /// use memento::{ConfigError, Memoized};
    /// use memento_store::testing::MockStore;
    /// use tick::Clock;
    ///
    /// let user = Memoized::builder::<u64, String>(Clock::new_frozen())
    ///     .store(MockStore::new())
    ///     .key_fn(|_, id| format!("user:{id}"))
    ///     .build(|id: u64| async move { Ok::<_, ConfigError>(format!("user {id}")) });
    ///
    /// assert_eq!(user.key_for(&42)?, "user:42");
    /// # Ok::<(), memento::KeyError>(())
    /// ```
    #[must_use]
    pub fn key_fn<K>(mut self, key_fn: K) -> Self
    where
        K: Fn(&FunctionId, &A) -> String + Send + Sync + 'static,
    {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    /// Overrides the identity used in default keys.
    ///
    /// By default the identity is taken from the type name of the wrapped function.
    /// Closures get a per-build discriminator instead, so a closure whose entries are
    /// shared across processes needs an explicit identity, as does a function whose keys
    /// must survive being moved to another module.
    #[must_use]
    pub fn function_id(mut self, id: FunctionId) -> Self {
        self.function_id = Some(id);
        self
    }

    /// Sets the logging and metrics sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: MemoTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Wraps `function`.
    ///
    /// `function` is any `Fn(A) -> impl Future<Output = Result<T, E>>`, where `E`
    /// implements `From<ConfigError>`. The bounds are checked when the memoized
    /// function is called.
    pub fn build<F>(self, function: F) -> Memoized<A, T, F, S>
    where
        F: 'static,
        S: RemoteStore,
    {
        let id = self.function_id.unwrap_or_else(FunctionId::of::<F>);
        Memoized::new(
            id,
            function,
            self.binding,
            KeyDeriver::new(self.key_prefix, self.key_fn),
            self.ttl,
            self.telemetry,
            self.clock,
        )
    }
}

impl<A, T, S> fmt::Debug for MemoBuilder<A, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoBuilder")
            .field("binding", &self.binding)
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .field("key_fn", &self.key_fn.is_some())
            .field("function_id", &self.function_id)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use memento_store::testing::MockStore;

    use super::*;
    use crate::ConfigError;

    async fn triple(x: i32) -> Result<i32, ConfigError> {
        Ok(x * 3)
    }

    #[test]
    fn defaults() {
        let memo = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store(MockStore::new())
            .build(triple);

        assert_eq!(memo.ttl(), Some(DEFAULT_TTL));
        assert_eq!(memo.function_id().name(), "triple");
        assert!(memo.store().is_some());
    }

    #[test]
    fn no_expiration_clears_ttl() {
        let memo = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store(MockStore::new())
            .ttl(Duration::from_secs(5))
            .no_expiration()
            .build(triple);

        assert_eq!(memo.ttl(), None);
    }

    #[test]
    fn function_id_override() {
        let memo = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store(MockStore::new())
            .function_id(FunctionId::new("app", "tripler"))
            .build(triple);

        assert_eq!(memo.function_id(), &FunctionId::new("app", "tripler"));
        assert!(memo.key_for(&1).unwrap().starts_with("app:tripler:"));
    }

    #[test]
    fn store_address_binds_lazily() {
        let memo = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store_address::<MockStore>("mock://cache")
            .build(triple);

        assert!(memo.store().is_none());
    }

    #[test]
    fn address_does_not_replace_a_supplied_store() {
        let store = MockStore::new();
        let builder = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store(store)
            .address("mock://ignored");

        assert!(matches!(builder.binding, StoreBinding::Ready(_)));
    }

    #[test]
    fn address_after_store_type_binds_lazily() {
        let builder = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store_type::<MockStore>()
            .address("mock://late");

        assert_eq!(builder.binding.address(), Some("mock://late"));
    }

    #[test]
    fn debug_omits_key_fn_body() {
        let builder = Memoized::builder::<i32, i32>(Clock::new_frozen())
            .store(MockStore::new())
            .key_prefix("p")
            .key_fn(|_, x| x.to_string());

        let debug = format!("{builder:?}");
        assert!(debug.contains("key_prefix: Some(\"p\")"), "{debug}");
        assert!(debug.contains("key_fn: true"), "{debug}");
    }
}
