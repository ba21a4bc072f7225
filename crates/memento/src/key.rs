// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache key derivation.
//!
//! The default key is `{module}:{name}:{hash}`, where `hash` is the XXH3-64 digest of
//! the canonical JSON encoding of the call's arguments. Because the encoding sorts
//! object keys, named arguments may be supplied in any order. Because the digest is
//! computed over bytes rather than in-memory layout, keys are stable across restarts
//! and across processes sharing one store.

use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde::Serialize;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

use crate::{codec, error::KeyError};

const CLOSURE: &str = "{{closure}}";

/// A custom key function.
///
/// Receives the identity of the memoized function and the call's arguments and
/// returns the key to use. When configured it replaces the default derivation
/// entirely; a configured prefix is still prepended.
pub type KeyFn<A> = Arc<dyn Fn(&FunctionId, &A) -> String + Send + Sync>;

/// The identity of a memoized function: its module path and name.
///
/// Two memoized functions with the same identity share cache entries for equal
/// arguments, so give distinct functions distinct identities.
///
/// # Examples
///
/// ```
/// use memento::{FunctionId, function_id};
///
/// let id = FunctionId::new("app::users", "load_user");
/// assert_eq!(id.to_string(), "app::users:load_user");
///
/// async fn load_user(id: u32) -> u32 { id }
/// let id = function_id!(load_user);
/// assert_eq!(id.name(), "load_user");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId {
    module: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl FunctionId {
    /// Creates an identity from a module path and a name.
    pub fn new(module: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Derives an identity from the type name of `F`.
    ///
    /// For a function item this is its full path, for example `app::users::load_user`.
    ///
    /// Every closure in one enclosing function has the type name `{{closure}}`, so a
    /// closure's name is suffixed with a digest of its `TypeId`. That digest is only
    /// stable within one build of the program: give closures an explicit identity when
    /// their entries must be shared across processes or survive a redeploy.
    #[must_use]
    pub fn of<F: ?Sized + 'static>() -> Self {
        let (module, name) = split_path(type_name::<F>());
        if !name.contains(CLOSURE) {
            return Self::new(module, name);
        }
        let mut hasher = Xxh3::new();
        TypeId::of::<F>().hash(&mut hasher);
        Self::new(module, format!("{name}#{:016x}", hasher.finish()))
    }

    /// Returns the module path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// Builds a [`FunctionId`] for a function in the current module.
///
/// ```
/// # async fn fetch_secret(name: String) -> String { name }
/// let id = memento::function_id!(fetch_secret);
/// assert_eq!(id.module(), module_path!());
/// ```
#[macro_export]
macro_rules! function_id {
    ($name:ident) => {
        $crate::FunctionId::new(::core::module_path!(), ::core::stringify!($name))
    };
}

/// Computes the default key for a call.
///
/// # Errors
///
/// Returns an error if `args` has no JSON representation.
///
/// # Examples
///
/// ```
/// use memento::{FunctionId, key::default_key};
///
/// let id = FunctionId::new("app", "double");
/// let key = default_key(&id, &(5,))?;
/// assert!(key.starts_with("app:double:"));
/// assert_eq!(key, default_key(&id, &(5,))?);
/// assert_ne!(key, default_key(&id, &(6,))?);
/// # Ok::<(), memento::KeyError>(())
/// ```
pub fn default_key<A>(id: &FunctionId, args: &A) -> Result<String, KeyError>
where
    A: Serialize + ?Sized,
{
    let encoded = codec::encode(args).map_err(|e| KeyError::caused_by(id.to_string(), e))?;
    Ok(format!("{id}:{:016x}", xxh3_64(encoded.as_bytes())))
}

/// Key derivation as configured for one memoized function.
pub(crate) struct KeyDeriver<A> {
    prefix: Option<String>,
    key_fn: Option<KeyFn<A>>,
}

impl<A> KeyDeriver<A> {
    pub(crate) fn new(prefix: Option<String>, key_fn: Option<KeyFn<A>>) -> Self {
        Self { prefix, key_fn }
    }

    pub(crate) fn derive(&self, id: &FunctionId, args: &A) -> Result<String, KeyError>
    where
        A: Serialize,
    {
        let base = match &self.key_fn {
            Some(key_fn) => key_fn(id, args),
            None => default_key(id, args)?,
        };
        Ok(match &self.prefix {
            Some(prefix) => format!("{prefix}:{base}"),
            None => base,
        })
    }
}

impl<A> fmt::Debug for KeyDeriver<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDeriver")
            .field("prefix", &self.prefix)
            .field("key_fn", &self.key_fn.is_some())
            .finish()
    }
}

/// Splits a type path into module and item name, ignoring separators inside generics.
fn split_path(path: &'static str) -> (&'static str, &'static str) {
    let mut depth = 0_usize;
    let mut split = None;
    for (index, ch) in path.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && path[index + 1..].starts_with(':') && !path[..index].ends_with(':') => split = Some(index),
            _ => {}
        }
    }
    match split {
        Some(index) => (&path[..index], &path[index + 2..]),
        None => ("", path),
    }
}
