// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lazy binding of a memoized function to its store client.

use std::fmt;

use async_once_cell::OnceCell;
use futures::future::BoxFuture;
use memento_store::{ConnectStore, Error};

type Connector<S> = Box<dyn Fn(String) -> BoxFuture<'static, Result<S, Error>> + Send + Sync>;

/// How a memoized function reaches its store.
pub(crate) enum StoreBinding<S> {
    /// A client handed in by the caller.
    Ready(S),
    /// A client built from `address` on first use and reused afterwards.
    Lazy {
        address: String,
        connect: Connector<S>,
        cell: OnceCell<S>,
    },
    /// Neither a client nor an address; first use is a configuration error.
    Unwired,
}

impl<S> StoreBinding<S> {
    pub(crate) fn lazy(address: String) -> Self
    where
        S: ConnectStore + 'static,
    {
        Self::Lazy {
            address,
            connect: Box::new(|address| Box::pin(async move { S::connect(&address).await })),
            cell: OnceCell::new(),
        }
    }

    /// Returns the client if one is available without connecting.
    pub(crate) fn get(&self) -> Option<&S> {
        match self {
            Self::Ready(store) => Some(store),
            Self::Lazy { cell, .. } => cell.get(),
            Self::Unwired => None,
        }
    }

    /// Returns the connection address, if the client is built lazily.
    pub(crate) fn address(&self) -> Option<&str> {
        match self {
            Self::Lazy { address, .. } => Some(address),
            Self::Ready(_) | Self::Unwired => None,
        }
    }

    /// Returns the client, connecting first if needed.
    ///
    /// Concurrent callers share one connection attempt. A failed attempt leaves the
    /// binding unconnected so a later call tries again.
    pub(crate) async fn connect(&self) -> Result<&S, Error> {
        match self {
            Self::Ready(store) => Ok(store),
            Self::Lazy { address, connect, cell } => cell.get_or_try_init(connect(address.clone())).await,
            Self::Unwired => Err(Error::permanent("no store client or address configured")),
        }
    }
}

impl<S> fmt::Debug for StoreBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Lazy { address, cell, .. } => f
                .debug_struct("Lazy")
                .field("address", address)
                .field("connected", &cell.get().is_some())
                .finish(),
            Self::Unwired => f.write_str("Unwired"),
        }
    }
}
