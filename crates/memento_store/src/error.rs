// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store operations.

use recoverable::{Recovery, RecoveryInfo, RecoveryKind};

/// An error from a store operation.
///
/// This is an opaque error type that wraps the underlying client error. Each error is
/// classified through [`Recovery`]: transient faults (timeouts, dropped connections) may
/// heal on their own, permanent faults (a malformed connection descriptor) will not.
///
/// # Example
///
/// ```
/// use memento_store::Error;
/// use recoverable::{Recovery, RecoveryKind};
///
/// let error = Error::transient("connection reset");
/// assert_eq!(error.recovery().kind(), RecoveryKind::Retry);
///
/// let error = Error::permanent("invalid URL scheme");
/// assert!(error.is_permanent());
/// ```
#[ohno::error]
#[display("store operation failed ({recovery})")]
pub struct Error {
    recovery: RecoveryInfo,
}

impl Error {
    /// Creates an error for a fault that may clear up if the operation is attempted again.
    pub fn transient(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(RecoveryInfo::retry(), cause)
    }

    /// Creates an error for a fault that will not clear up without a configuration change.
    pub fn permanent(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(RecoveryInfo::never(), cause)
    }

    /// Returns `true` if retrying the operation cannot help.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.recovery.kind() == RecoveryKind::Never
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        self.recovery.clone()
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
