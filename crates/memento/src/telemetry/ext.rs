// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extension traits for timing store operations.

use std::time::Duration;

use tick::Clock;

/// Result of a timed async operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedResult<R> {
    pub result: R,
    pub duration: Duration,
}

pub(crate) trait ClockExt {
    /// Times an async operation and returns both the result and elapsed duration.
    fn timed_async<F, R>(&self, f: F) -> impl Future<Output = TimedResult<R>>
    where
        F: Future<Output = R>;
}

impl ClockExt for Clock {
    async fn timed_async<F, R>(&self, f: F) -> TimedResult<R>
    where
        F: Future<Output = R>,
    {
        let start = self.instant();
        let result = f.await;
        TimedResult {
            result,
            duration: self.instant().saturating_duration_since(start),
        }
    }
}
