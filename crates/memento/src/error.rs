// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for memoized calls.
//!
//! Only [`ConfigError`] ever reaches the caller of a memoized function. The other
//! types describe faults the wrapper absorbs by falling back to calling the function.

/// A memoized function was called without a usable backing store.
///
/// Raised on first use when neither a store client nor a connection address was
/// configured, or when the configured address was rejected as malformed. This is a
/// programming error rather than an outage, so it is never absorbed.
///
/// Error types returned by memoized functions must implement `From<ConfigError>`
/// so the wrapper can surface it through the function's own signature.
///
/// # Example
///
/// ```
/// use memento::ConfigError;
///
/// #[derive(Debug)]
/// enum AppError {
///     Cache(ConfigError),
///     NotFound,
/// }
///
/// impl From<ConfigError> for AppError {
///     fn from(error: ConfigError) -> Self {
///         Self::Cache(error)
///     }
/// }
/// ```
#[ohno::error]
#[display("memoized function `{function}` is not wired to a backing store")]
pub struct ConfigError {
    function: String,
}

impl ConfigError {
    /// Returns the identity of the function that was called.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }
}

/// The arguments of a call could not be turned into a cache key.
#[ohno::error]
#[display("cannot derive a cache key for `{function}`")]
pub struct KeyError {
    function: String,
}

/// A value could not be encoded for, or decoded from, the store.
#[ohno::error]
pub struct CodecError {}
